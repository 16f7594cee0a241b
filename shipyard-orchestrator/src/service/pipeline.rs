//! Pipeline Service
//!
//! Drives one pipeline run end to end:
//! - Trigger gate (tagged events do not run)
//! - Parallel variant runs, joined before anything is decided
//! - Variant reports written to the report store
//! - Publish gate (all variants succeeded, release branch)
//! - Release descriptor and publish
//!
//! A run covering only some of the configured variants never publishes; it
//! defers to `aggregate`, which judges the stored reports of every configured
//! variant together.
//!
//! Every outcome is a value; neither `run` nor `aggregate` fails.

use shipyard_core::domain::artifact::Artifact;
use shipyard_core::domain::outcome::{
    FailureKind, PipelineOutcome, PipelineStatus, VariantReport,
};
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::release::ReleaseDescriptor;
use shipyard_core::domain::trigger::Trigger;
use shipyard_core::domain::variant::Variant;
use shipyard_runner::ExecutionService;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::gate::{self, PublishDecision};
use crate::scheduler::VariantScheduler;
use crate::service::publish::{PublishError, Publisher};
use crate::store::ReportStore;

/// Runs the pipeline for a trigger
pub struct Orchestrator {
    config: Arc<PipelineConfig>,
    /// OS identifiers to run; empty runs every configured variant
    selection: Vec<String>,
    defer_publish: bool,
    scheduler: VariantScheduler,
    store: ReportStore,
    publisher: Option<Arc<dyn Publisher>>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    /// Creates an orchestrator with no publisher and the system clock
    pub fn new(config: PipelineConfig, execution: Arc<dyn ExecutionService>) -> Self {
        Self {
            store: ReportStore::for_config(&config),
            config: Arc::new(config),
            selection: Vec::new(),
            defer_publish: false,
            scheduler: VariantScheduler::new(execution),
            publisher: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Caps how many variants run at the same time
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.scheduler = self.scheduler.with_max_parallel(max_parallel);
        self
    }

    /// Runs only the variants with these OS identifiers
    ///
    /// When that leaves out any configured variant, `run` defers publishing.
    pub fn with_selection(mut self, oses: Vec<String>) -> Self {
        self.selection = oses;
        self
    }

    /// Builds and records the variants but leaves publishing to `aggregate`
    pub fn defer_publish(mut self) -> Self {
        self.defer_publish = true;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Release descriptor for `commit` at the current clock reading
    pub fn describe_release(&self, commit: &str) -> ReleaseDescriptor {
        ReleaseDescriptor::compute(&self.config, commit, self.clock.now())
    }

    /// Variants this orchestrator runs, in configuration order
    fn selected_variants(&self) -> Vec<Variant> {
        self.config
            .variants
            .iter()
            .filter(|v| self.selection.is_empty() || self.selection.contains(&v.os))
            .cloned()
            .collect()
    }

    /// Runs the selected variants and publishes when the gate allows it
    pub async fn run(&self, trigger: &Trigger) -> PipelineOutcome {
        if !gate::pipeline_enabled(trigger) {
            info!("Trigger carries a tag; skipping pipeline");
            return PipelineOutcome::skipped_by_gate();
        }

        let selected = self.selected_variants();
        let partial = selected.len() < self.config.variants.len();

        info!(
            "Starting pipeline for {} on branch {} (commit {}, {} of {} variants)",
            self.config.binary_name,
            trigger.branch,
            trigger.commit,
            selected.len(),
            self.config.variants.len()
        );

        let config = Arc::new(self.config.as_ref().clone().with_variants(selected));
        let variants = self.scheduler.run_all(config).await;

        self.record(&trigger.commit, &variants).await;

        if partial {
            info!("Partial variant selection; publishing is left to the aggregation step");
        }
        self.conclude(trigger, variants, partial || self.defer_publish)
            .await
    }

    /// Decides the release from the stored reports of every configured
    /// variant
    ///
    /// A variant without a report from `trigger.commit` counts as failed,
    /// so nothing is published until every configured variant has
    /// succeeded.
    pub async fn aggregate(&self, trigger: &Trigger) -> PipelineOutcome {
        if !gate::pipeline_enabled(trigger) {
            info!("Trigger carries a tag; skipping publish");
            return PipelineOutcome::skipped_by_gate();
        }

        info!(
            "Aggregating {} variant report(s) for commit {}",
            self.config.variants.len(),
            trigger.commit
        );

        let variants = self.store.load_all(&self.config, &trigger.commit).await;
        self.conclude(trigger, variants, false).await
    }

    async fn record(&self, commit: &str, variants: &[VariantReport]) {
        for report in variants {
            if let Err(e) = self.store.save(commit, report).await {
                warn!("[{}] Report not saved: {:#}", report.variant.os, e);
            }
        }
    }

    async fn conclude(
        &self,
        trigger: &Trigger,
        variants: Vec<VariantReport>,
        defer: bool,
    ) -> PipelineOutcome {
        let all_succeeded = !variants.is_empty() && variants.iter().all(|v| v.succeeded());
        let on_branch = gate::on_target_branch(trigger, &self.config.target_branch);

        let (status, release) = match gate::decide(trigger.tag_blank, all_succeeded, on_branch) {
            PublishDecision::SkipPipeline => (PipelineStatus::SkippedByGate, None),
            PublishDecision::VariantsFailed => {
                let failed: Vec<&str> = variants
                    .iter()
                    .filter(|v| !v.succeeded())
                    .map(|v| v.variant.os.as_str())
                    .collect();
                warn!("Variants failed ({}); not publishing", failed.join(", "));
                (PipelineStatus::VariantsFailed, None)
            }
            PublishDecision::NotOnReleaseBranch => {
                info!(
                    "Branch {} is not the release branch {}; artifacts kept in {}",
                    trigger.branch,
                    self.config.target_branch,
                    self.config.artifact_path().display()
                );
                (
                    PipelineStatus::NotOnReleaseBranch {
                        branch: trigger.branch.clone(),
                        target: self.config.target_branch.clone(),
                    },
                    None,
                )
            }
            PublishDecision::Publish if defer => {
                let built = variants.iter().map(|v| v.variant.os.clone()).collect();
                (PipelineStatus::PublishDeferred { built }, None)
            }
            PublishDecision::Publish => {
                let descriptor = self.describe_release(&trigger.commit);
                let artifacts: Vec<Artifact> = variants
                    .iter()
                    .filter(|v| v.succeeded())
                    .filter_map(|v| v.artifact.clone())
                    .collect();
                let status = self.publish(&descriptor, &artifacts).await;
                (status, Some(descriptor))
            }
        };

        PipelineOutcome {
            status,
            variants,
            release,
        }
    }

    async fn publish(&self, descriptor: &ReleaseDescriptor, artifacts: &[Artifact]) -> PipelineStatus {
        info!(
            "Publishing release '{}' (tag: {})",
            descriptor.name, descriptor.tag
        );

        let result = match &self.publisher {
            Some(publisher) => publisher.publish(descriptor, artifacts).await,
            None => Err(PublishError::NotConfigured(
                "no release credential or repository configured".to_string(),
            )),
        };

        match result {
            Ok(release) => {
                info!("Published release {} at {}", release.id, release.url);
                PipelineStatus::Published { release }
            }
            Err(e) => {
                error!("Publish failed: {}", e);
                PipelineStatus::PublishFailed {
                    kind: FailureKind::PublishFailure,
                    message: e.to_string(),
                }
            }
        }
    }
}
