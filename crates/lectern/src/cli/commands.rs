//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use lectern::{ContentType, Difficulty, WorksheetLength};
use std::path::PathBuf;

/// Lectern - LLM-backed workbook and worksheet generation
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(about = "LLM-backed workbook and worksheet generation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ten-stage workbook pipeline
    Workbook {
        /// Subject area
        #[arg(long)]
        subject: String,

        /// Topic within the subject
        #[arg(long)]
        topic: String,

        /// Grade level
        #[arg(long)]
        grade: String,

        /// Workbook title
        #[arg(long)]
        title: Option<String>,

        /// Number of sections
        #[arg(long, default_value = "3")]
        sections: u32,

        /// Difficulty
        #[arg(long, default_value = "medium", value_parser = parse_difficulty)]
        difficulty: Difficulty,

        /// Describe illustrations
        #[arg(long)]
        visuals: bool,

        /// Write the workbook JSON here
        #[arg(long, default_value = "workbook.json")]
        out: PathBuf,

        /// Output format for the run summary
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Generate a multi-part worksheet with provider fallback
    Worksheet {
        /// Subject area
        #[arg(long)]
        subject: String,

        /// Topic within the subject
        #[arg(long)]
        topic: String,

        /// Grade level
        #[arg(long)]
        grade: String,

        /// Content types, comma separated (e.g. math_problems,quiz)
        #[arg(long, value_delimiter = ',', required = true, value_parser = parse_content_type)]
        types: Vec<ContentType>,

        /// Difficulty
        #[arg(long, default_value = "medium", value_parser = parse_difficulty)]
        difficulty: Difficulty,

        /// Worksheet length
        #[arg(long, default_value = "medium", value_parser = parse_length)]
        length: WorksheetLength,

        /// Attach visuals to the first section
        #[arg(long)]
        visuals: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show cached health of every configured service
    Health {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// List the model catalog
    Models,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

fn parse_content_type(value: &str) -> Result<ContentType, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("unknown content type '{}'", value))
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    value
        .parse()
        .map_err(|_| format!("unknown difficulty '{}'", value))
}

fn parse_length(value: &str) -> Result<WorksheetLength, String> {
    value
        .parse()
        .map_err(|_| format!("unknown length '{}'", value))
}
