//! Vocadeck CLI
//!
//! Illustrated flashcard decks from vocabulary tables.

use anyhow::Result;
use clap::Parser;
use vocadeck_core::error::exit_codes;
use vocadeck_core::{Config, VocadeckError};

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build(args) => commands::build::run(args, config, cli.format).await,
        Commands::Convert(args) => commands::convert::run(args).await,
        Commands::FixTable(args) => commands::fix_table::run(args).await,
        Commands::Cache(args) => commands::cache::run(args, &config, cli.format).await,
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<VocadeckError>()
        .map(VocadeckError::exit_code)
        .unwrap_or(exit_codes::GENERAL_ERROR)
}
