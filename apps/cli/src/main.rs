//! adlib CLI — scroll an Ad Library keyword search and export Library IDs.
//!
//! Opens the search in a headless browser (or replays saved captures),
//! keeps scrolling until enough ad cards have rendered, and writes their
//! Library IDs to CSV.

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
