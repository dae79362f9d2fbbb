//! ReportDesk CLI — report fragment archival and PDF assembly tool.
//!
//! Moves per-section JSON fragments from the downloads directory into the
//! archive and assembles the archived data into a final PDF report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
