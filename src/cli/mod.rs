//! Command line interface.

mod check;
mod serve;
mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "invrec")]
#[command(about = "Invoice PDF vs ledger export reconciliation")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true, env = "INVREC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ReportFormatArg {
    #[default]
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Bind address (port, host, or host:port); overrides the configured one
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Reconcile a ledger sheet against PDFs from the filesystem
    Check {
        /// Ledger export (xlsx, xls or csv)
        sheet: PathBuf,

        /// PDF files or directories of PDFs
        documents: Vec<PathBuf>,

        /// Write the full report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ReportFormatArg,
    },

    /// Check availability of the external extraction tool
    Tools,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Arc::new(load_settings(cli.config.as_deref())?);

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(settings, bind.as_deref()).await,
        Commands::Check {
            sheet,
            documents,
            report,
            format,
        } => check::cmd_check(settings, &sheet, &documents, report.as_deref(), format).await,
        Commands::Tools => tools::cmd_tools(&settings),
    }
}
