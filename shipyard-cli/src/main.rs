//! Shipyard CLI
//!
//! Runs the release pipeline for a Rust binary on the current host: checks,
//! builds and compresses every variant, then publishes a draft preview
//! release when the trigger allows it.

mod commands;
mod report;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Shipyard CI/release pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so `--json` output stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shipyard=info,shipyard_orchestrator=info,shipyard_runner=info,shipyard_client=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    handle_command(cli.command).await
}
