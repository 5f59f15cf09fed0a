//! Binary crate for the `tenki` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring the city table, client and renderer together
//! - Console and HTML file output

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries only the forecast text and
    // the user-facing status lines.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
