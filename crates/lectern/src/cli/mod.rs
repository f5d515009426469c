//! Command-line interface module.

mod commands;
mod handlers;

pub use commands::{Cli, Commands, OutputFormat};
pub use handlers::{
    WorkbookArgs, WorksheetArgs, list_models, run_workbook, run_worksheet, show_health,
};
