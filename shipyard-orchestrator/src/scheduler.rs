//! Variant scheduler
//!
//! Runs every variant as its own task and joins them before returning.
//! A variant that fails never cancels the others; a task that panics is
//! reported as an aborted variant instead of taking the run down.

use shipyard_core::domain::outcome::VariantReport;
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_runner::ExecutionService;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Schedules variant runs onto the tokio runtime
pub struct VariantScheduler {
    execution: Arc<dyn ExecutionService>,
    max_parallel: Option<usize>,
}

impl VariantScheduler {
    /// Creates a scheduler running every variant at once
    pub fn new(execution: Arc<dyn ExecutionService>) -> Self {
        Self {
            execution,
            max_parallel: None,
        }
    }

    /// Caps how many variants run at the same time
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel.max(1));
        self
    }

    /// Runs every configured variant and returns their reports in
    /// configuration order
    pub async fn run_all(&self, config: Arc<PipelineConfig>) -> Vec<VariantReport> {
        let permits = self.max_parallel.unwrap_or(config.variants.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        info!(
            "Scheduling {} variant(s), at most {} at a time",
            config.variants.len(),
            permits
        );

        let mut handles = Vec::with_capacity(config.variants.len());

        for variant in config.variants.iter().cloned() {
            let execution = Arc::clone(&self.execution);
            let config = Arc::clone(&config);
            let semaphore = Arc::clone(&semaphore);
            let task_variant = variant.clone();

            let handle = tokio::spawn(async move {
                // Closed semaphores never happen here; run unthrottled if one does
                let _permit = semaphore.acquire_owned().await.ok();
                execution.execute_variant(&config, &task_variant).await
                // Permit is released when dropped
            });

            handles.push((variant, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());

        for (variant, handle) in handles {
            match handle.await {
                Ok(report) => {
                    match report.failure() {
                        Some(kind) => warn!("[{}] variant failed: {}", variant.os, kind),
                        None => info!("[{}] variant finished: {}", variant.os, report.state),
                    }
                    reports.push(report);
                }
                Err(e) => {
                    error!("[{}] variant task panicked: {}", variant.os, e);
                    reports.push(VariantReport::aborted(
                        variant,
                        format!("variant task aborted: {}", e),
                    ));
                }
            }
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shipyard_core::domain::outcome::FailureKind;
    use shipyard_core::domain::step::VariantState;
    use shipyard_core::domain::variant::Variant;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    fn report(variant: &Variant, state: VariantState) -> VariantReport {
        VariantReport {
            run_id: Uuid::new_v4(),
            variant: variant.clone(),
            state,
            history: vec![VariantState::Pending, state],
            steps: Vec::new(),
            artifact: None,
            logs: Vec::new(),
        }
    }

    /// Fails "linux" with a lint violation, panics on "broken", tracks
    /// how many runs overlap
    #[derive(Default)]
    struct FakeExecution {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionService for FakeExecution {
        async fn execute_variant(&self, _config: &PipelineConfig, variant: &Variant) -> VariantReport {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            match variant.os.as_str() {
                "broken" => panic!("runner exploded"),
                "linux" => report(variant, VariantState::Failed(FailureKind::LintViolation)),
                _ => report(variant, VariantState::Done),
            }
        }
    }

    fn config(oses: &[&str]) -> Arc<PipelineConfig> {
        let variants = oses
            .iter()
            .map(|os| Variant::new(*os, *os, Variant::osx().compressor_install))
            .collect();
        Arc::new(PipelineConfig::new("seeker").with_variants(variants))
    }

    #[tokio::test]
    async fn test_reports_keep_configuration_order() {
        let scheduler = VariantScheduler::new(Arc::new(FakeExecution::default()));
        let reports = scheduler.run_all(config(&["osx", "linux", "windows"])).await;

        let oses: Vec<&str> = reports.iter().map(|r| r.variant.os.as_str()).collect();
        assert_eq!(oses, vec!["osx", "linux", "windows"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        let scheduler = VariantScheduler::new(Arc::new(FakeExecution::default()));
        let reports = scheduler.run_all(config(&["osx", "linux"])).await;

        assert_eq!(reports[0].state, VariantState::Done);
        assert_eq!(reports[1].failure(), Some(FailureKind::LintViolation));
    }

    #[tokio::test]
    async fn test_panicking_variant_is_aborted() {
        let scheduler = VariantScheduler::new(Arc::new(FakeExecution::default()));
        let reports = scheduler.run_all(config(&["broken", "osx"])).await;

        assert_eq!(reports[0].failure(), Some(FailureKind::Aborted));
        assert_eq!(reports[0].variant.os, "broken");
        assert_eq!(reports[1].state, VariantState::Done);
    }

    #[tokio::test]
    async fn test_variants_run_concurrently() {
        let execution = Arc::new(FakeExecution::default());
        let scheduler = VariantScheduler::new(execution.clone());
        scheduler.run_all(config(&["a", "b", "c"])).await;

        assert!(execution.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_max_parallel_limits_overlap() {
        let execution = Arc::new(FakeExecution::default());
        let scheduler = VariantScheduler::new(execution.clone()).with_max_parallel(1);
        let reports = scheduler.run_all(config(&["a", "b", "c"])).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(execution.peak.load(Ordering::SeqCst), 1);
    }
}
