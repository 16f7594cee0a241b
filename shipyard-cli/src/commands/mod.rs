//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod plan;
mod publish;
mod release;
mod run;

pub use plan::PlanArgs;
pub use publish::PublishArgs;
pub use release::ReleaseNameArgs;
pub use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::variant::Variant;
use std::process::ExitCode;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline: check, build, compress and publish
    Run(RunArgs),
    /// Publish from the reports of every variant, once all were built
    Publish(PublishArgs),
    /// Print the steps each variant would run, without running them
    Plan(PlanArgs),
    /// Print the release descriptor a publish would use
    ReleaseName(ReleaseNameArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Returns
/// The process exit code
pub async fn handle_command(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Run(args) => run::handle_run(args).await,
        Commands::Publish(args) => publish::handle_publish(args).await,
        Commands::Plan(args) => plan::handle_plan(args),
        Commands::ReleaseName(args) => release::handle_release_name(args),
    }
}

/// Fails on OS identifiers in `only` that name no configured variant
pub(crate) fn check_selection(config: &PipelineConfig, only: &[String]) -> Result<()> {
    if let Some(unknown) = only
        .iter()
        .find(|os| !config.variants.iter().any(|v| &v.os == *os))
    {
        let known: Vec<&str> = config.variants.iter().map(|v| v.os.as_str()).collect();
        anyhow::bail!(
            "Unknown variant '{}' (available: {})",
            unknown,
            known.join(", ")
        );
    }
    Ok(())
}

/// Restricts the configuration to the variants named in `only`
///
/// An empty filter keeps every variant. Unknown OS identifiers are an error.
pub(crate) fn select_variants(config: PipelineConfig, only: &[String]) -> Result<PipelineConfig> {
    if only.is_empty() {
        return Ok(config);
    }
    check_selection(&config, only)?;

    let selected: Vec<Variant> = config
        .variants
        .iter()
        .filter(|v| only.contains(&v.os))
        .cloned()
        .collect();

    Ok(config.with_variants(selected))
}
