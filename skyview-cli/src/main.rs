//! Binary crate for the `skyview` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and suggestion search
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with the rendered panel.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
