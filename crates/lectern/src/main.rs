//! Lectern CLI binary.
//!
//! - Run the workbook pipeline
//! - Generate worksheets with provider fallback
//! - Inspect service health and the model catalog

use clap::Parser;
use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, WorkbookArgs, WorksheetArgs, list_models, run_workbook, run_worksheet,
        show_health,
    };

    // API keys may live in a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    lectern::init_tracing(cli.verbose, cli.json_logs)?;

    let lectern = lectern::Lectern::load(cli.config.as_deref())?;

    let ok = match cli.command {
        Commands::Workbook {
            subject,
            topic,
            grade,
            title,
            sections,
            difficulty,
            visuals,
            out,
            format,
        } => {
            let args = WorkbookArgs {
                subject,
                topic,
                grade,
                title,
                sections,
                difficulty,
                visuals,
                out,
            };
            run_workbook(&lectern, args, format).await?
        }

        Commands::Worksheet {
            subject,
            topic,
            grade,
            types,
            difficulty,
            length,
            visuals,
            format,
        } => {
            let args = WorksheetArgs {
                subject,
                topic,
                grade,
                types,
                difficulty,
                length,
                visuals,
            };
            run_worksheet(&lectern, args, format).await?
        }

        Commands::Health { format } => show_health(&lectern, format).await,

        Commands::Models => {
            list_models(&lectern);
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
