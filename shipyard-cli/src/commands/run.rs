//! Run command handler
//!
//! Loads the configuration, wires the real command runner and release
//! client into the orchestrator, runs the pipeline and reports the outcome.
//! A run limited with `--only` or `--no-publish` builds and records its
//! variants; `shipyard publish` releases them once every variant is in.

use anyhow::{Context, Result};
use clap::Args;
use shipyard_client::ReleaseClient;
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::trigger::Trigger;
use shipyard_orchestrator::config;
use shipyard_orchestrator::{Orchestrator, Publisher, ReleasePublisher};
use shipyard_runner::{StandardExecutionService, SystemCommandRunner};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

use crate::commands::check_selection;
use crate::report;

/// Arguments of `shipyard run`
#[derive(Args)]
pub struct RunArgs {
    /// Branch the trigger event was pushed to
    #[arg(long, env = "PIPELINE_BRANCH")]
    pub branch: String,

    /// Tag carried by the trigger event; any non-blank tag skips the pipeline
    #[arg(long, env = "PIPELINE_TAG")]
    pub tag: Option<String>,

    /// Commit identifier used in the release name
    #[arg(long, env = "PIPELINE_COMMIT")]
    pub commit: String,

    /// Only run these variants (by OS identifier); repeatable. Leaving out
    /// any configured variant defers publishing to `shipyard publish`
    #[arg(long = "only", value_name = "OS")]
    pub only: Vec<String>,

    /// Build and record the variants without publishing
    #[arg(long)]
    pub no_publish: bool,

    /// Maximum number of variants running at once
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handle `shipyard run`
pub async fn handle_run(args: RunArgs) -> Result<ExitCode> {
    let config = config::load_config().context("Failed to load pipeline configuration")?;
    check_selection(&config, &args.only)?;

    let trigger = Trigger::new(args.branch, args.tag.as_deref(), args.commit);

    let runner = Arc::new(SystemCommandRunner::new());
    let execution = Arc::new(StandardExecutionService::new(runner));

    let publisher = if args.no_publish {
        None
    } else {
        build_publisher(&config)
    };

    let mut orchestrator = Orchestrator::new(config, execution).with_selection(args.only);
    if let Some(publisher) = publisher {
        orchestrator = orchestrator.with_publisher(publisher);
    }
    if args.no_publish {
        orchestrator = orchestrator.defer_publish();
    }
    if let Some(jobs) = args.jobs {
        orchestrator = orchestrator.with_max_parallel(jobs);
    }

    let outcome = orchestrator.run(&trigger).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        report::print_outcome(&outcome);
    }

    Ok(ExitCode::from(outcome.exit_code()))
}

/// Builds the publisher when the credential and repository are configured
///
/// A missing publisher only matters if the run reaches the publish stage,
/// where it is reported as a publish failure.
pub(crate) fn build_publisher(config: &PipelineConfig) -> Option<Arc<dyn Publisher>> {
    match config::validate_for_publish(config) {
        Ok((token, repository)) => {
            info!(
                "Publishing to {} via {}",
                repository, config.release_api_url
            );
            let client = ReleaseClient::new(&config.release_api_url, repository, token.clone());
            Some(Arc::new(ReleasePublisher::new(Arc::new(client))))
        }
        Err(e) => {
            warn!("Publishing disabled: {:#}", e);
            None
        }
    }
}
