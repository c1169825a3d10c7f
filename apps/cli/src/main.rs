//! jaarverslag CLI: annual-report collection for Flemish and federal public bodies.
//!
//! Collects organisation names and annual-report links per source,
//! normalizes the names, pulls the lead text of every report, and writes
//! one CSV table per source plus a merged table.

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
