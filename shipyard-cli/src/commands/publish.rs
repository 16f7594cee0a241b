//! Publish command handler
//!
//! Gathers the reports written by earlier `shipyard run --only` invocations
//! and publishes once every configured variant succeeded on the commit. The
//! artifact directories of the build hosts must have been copied into this
//! host's artifact directory first.

use anyhow::{Context, Result};
use clap::Args;
use shipyard_core::domain::trigger::Trigger;
use shipyard_orchestrator::Orchestrator;
use shipyard_orchestrator::config;
use shipyard_runner::{StandardExecutionService, SystemCommandRunner};
use std::process::ExitCode;
use std::sync::Arc;

use crate::commands::run::build_publisher;
use crate::report;

/// Arguments of `shipyard publish`
#[derive(Args)]
pub struct PublishArgs {
    /// Branch the trigger event was pushed to
    #[arg(long, env = "PIPELINE_BRANCH")]
    pub branch: String,

    /// Tag carried by the trigger event; any non-blank tag skips publishing
    #[arg(long, env = "PIPELINE_TAG")]
    pub tag: Option<String>,

    /// Commit the variant reports must have been built from
    #[arg(long, env = "PIPELINE_COMMIT")]
    pub commit: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handle `shipyard publish`
pub async fn handle_publish(args: PublishArgs) -> Result<ExitCode> {
    let config = config::load_config().context("Failed to load pipeline configuration")?;
    let trigger = Trigger::new(args.branch, args.tag.as_deref(), args.commit);

    // Nothing is executed here; the service only satisfies the constructor
    let runner = Arc::new(SystemCommandRunner::new());
    let execution = Arc::new(StandardExecutionService::new(runner));

    let publisher = build_publisher(&config);

    let mut orchestrator = Orchestrator::new(config, execution);
    if let Some(publisher) = publisher {
        orchestrator = orchestrator.with_publisher(publisher);
    }

    let outcome = orchestrator.aggregate(&trigger).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        report::print_outcome(&outcome);
    }

    Ok(ExitCode::from(outcome.exit_code()))
}
