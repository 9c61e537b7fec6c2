//! Docgen CLI Binary
//!
//! Command-line interface for the document generation service.

use anyhow::Context;
use clap::Parser;
use docgen::logging::init_logging_with_file;
use docgen::tooling::cli::{Cli, CliContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli.load_config().context("Failed to load configuration")?;
    init_logging_with_file(Some(&cli.logging_config(&config.logging)), cli.log_file.clone())
        .context("Failed to initialize logging")?;

    let context = CliContext::from_config(&config, cli.subscription)
        .context("Failed to initialize client")?;
    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    Ok(())
}
