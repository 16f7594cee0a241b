//! Release name command handler

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use shipyard_core::domain::release::ReleaseDescriptor;
use shipyard_orchestrator::config;
use shipyard_orchestrator::{Clock, SystemClock};
use std::process::ExitCode;

/// Arguments of `shipyard release-name`
#[derive(Args)]
pub struct ReleaseNameArgs {
    /// Commit identifier used in the release name
    #[arg(long, env = "PIPELINE_COMMIT")]
    pub commit: String,

    /// Print the full descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handle `shipyard release-name`
pub fn handle_release_name(args: ReleaseNameArgs) -> Result<ExitCode> {
    let config = config::from_env().context("Failed to load pipeline configuration")?;
    let descriptor = ReleaseDescriptor::compute(&config, &args.commit, SystemClock.now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Release:".bold());
    println!("  Tag:       {}", descriptor.tag.cyan());
    println!("  Name:      {}", descriptor.name);
    println!("  Draft:     {}", descriptor.draft);
    println!("  Overwrite: {}", descriptor.overwrite);
    println!("  Files:     {}", descriptor.file_glob.dimmed());

    Ok(ExitCode::SUCCESS)
}
