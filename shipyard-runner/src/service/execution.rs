//! Execution service
//!
//! Handles a variant run:
//! - Planning the variant's steps
//! - Executing them one by one, strictly in order
//! - Driving the variant state machine
//! - Stopping at the first step that does not succeed
//!
//! Step failures are values, not errors: the service always returns a
//! `VariantReport`, whose state says how far the run got.

use async_trait::async_trait;
use shipyard_core::domain::artifact::Artifact;
use shipyard_core::domain::log::LogLevel;
use shipyard_core::domain::outcome::VariantReport;
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::step::{StepResult, VariantState};
use shipyard_core::domain::variant::Variant;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::context::Context;
use crate::plan::{Step, StepAction, plan_variant};
use crate::process::{CommandRunner, Invocation};
use crate::service::log_buffer::InMemoryLogBuffer;

/// Service trait for executing one variant
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Runs every step of `variant` until one fails
    ///
    /// # Returns
    /// The variant's report; `artifact` is set only if the run reached `Done`
    async fn execute_variant(&self, config: &PipelineConfig, variant: &Variant) -> VariantReport;
}

/// Standard implementation of ExecutionService
pub struct StandardExecutionService {
    runner: Arc<dyn CommandRunner>,
}

impl StandardExecutionService {
    /// Creates a service that runs external steps through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Executes a single step and captures its result
    async fn execute_step(&self, config: &PipelineConfig, step: &Step) -> StepResult {
        let started = Instant::now();

        let (exit_code, timed_out, output) = match &step.action {
            StepAction::Run { command } => {
                let invocation = Invocation {
                    command: command.clone(),
                    cwd: config.source_dir.clone(),
                    env: config.passthrough_env(),
                    timeout: config.step_timeout(),
                };
                match self.runner.run(&invocation).await {
                    Ok(output) => (output.exit_code, output.timed_out, output.combined()),
                    Err(e) => (None, false, format!("{:#}", e)),
                }
            }
            StepAction::CreateDir { path } => match tokio::fs::create_dir_all(path).await {
                Ok(()) => (Some(0), false, String::new()),
                Err(e) => (
                    None,
                    false,
                    format!("Failed to create {}: {}", path.display(), e),
                ),
            },
            StepAction::Copy { from, to } => match tokio::fs::copy(from, to).await {
                Ok(bytes) => (
                    Some(0),
                    false,
                    format!("Copied {} bytes to {}", bytes, to.display()),
                ),
                Err(e) => (
                    None,
                    false,
                    format!(
                        "Failed to copy {} to {}: {}",
                        from.display(),
                        to.display(),
                        e
                    ),
                ),
            },
        };

        StepResult {
            step: step.kind,
            exit_code,
            timed_out,
            output,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn report(
        ctx: Context,
        variant: &Variant,
        steps: Vec<StepResult>,
        artifact: Option<Artifact>,
    ) -> VariantReport {
        VariantReport {
            run_id: ctx.run_id,
            variant: variant.clone(),
            state: ctx.state(),
            history: ctx.history().to_vec(),
            steps,
            artifact,
            logs: ctx.drain_logs(),
        }
    }
}

#[async_trait]
impl ExecutionService for StandardExecutionService {
    async fn execute_variant(&self, config: &PipelineConfig, variant: &Variant) -> VariantReport {
        let mut ctx = Context::new(&variant.os, Arc::new(InMemoryLogBuffer::new()));
        let plan = plan_variant(config, variant);

        info!(
            "[{}] Starting run {} of {} ({} steps)",
            variant.os,
            ctx.run_id,
            variant,
            plan.len()
        );
        ctx.log_info(format!("Starting variant: {}", variant));

        let mut steps = Vec::with_capacity(plan.len());

        for (idx, step) in plan.iter().enumerate() {
            if let Some(state) = step.kind.state() {
                ctx.transition(state);
            }

            info!(
                "[{}] Executing step {}/{}: {}",
                variant.os,
                idx + 1,
                plan.len(),
                step.kind
            );
            ctx.log_info(format!("Starting step: {}", step.kind));

            let result = self.execute_step(config, step).await;

            if !result.succeeded() {
                let kind = step.kind.failure_kind();
                error!(
                    "[{}] Step '{}' failed ({}): exit code {:?}{}",
                    variant.os,
                    step.kind,
                    kind,
                    result.exit_code,
                    if result.timed_out { ", timed out" } else { "" }
                );
                ctx.log_error(format!("Step '{}' failed: {}", step.kind, kind));
                ctx.log_output(LogLevel::Error, &result.output);
                ctx.transition(VariantState::Failed(kind));

                steps.push(result);
                return Self::report(ctx, variant, steps, None);
            }

            debug!(
                "[{}] Step '{}' completed in {} ms",
                variant.os, step.kind, result.duration_ms
            );
            ctx.log_output(LogLevel::Debug, &result.output);
            ctx.log_info(format!("Step '{}' completed", step.kind));
            steps.push(result);
        }

        let artifact = Artifact::for_variant(config, variant);
        ctx.transition(VariantState::Collected);
        ctx.log_info(format!("Collected artifact {}", artifact.file_name));
        ctx.transition(VariantState::Done);

        info!(
            "[{}] Variant completed: {}",
            variant.os,
            artifact.path.display()
        );

        Self::report(ctx, variant, steps, Some(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use shipyard_core::domain::outcome::FailureKind;
    use shipyard_core::domain::step::StepKind;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted runner: succeeds unless the rendered command contains
    /// `fail_when`; `cargo build` writes a fake binary.
    #[derive(Default)]
    struct ScriptedRunner {
        fail_when: Option<String>,
        time_out_when: Option<String>,
        refuse_spawn: bool,
        binary: Option<PathBuf>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|inv| inv.command.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, invocation: &Invocation) -> anyhow::Result<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            let rendered = invocation.command.to_string();

            if self.refuse_spawn {
                anyhow::bail!("Failed to execute '{}': No such file", rendered);
            }
            if self.time_out_when.as_deref().is_some_and(|p| rendered.contains(p)) {
                return Ok(CommandOutput::timed_out(invocation.timeout));
            }
            if self.fail_when.as_deref().is_some_and(|p| rendered.contains(p)) {
                return Ok(CommandOutput {
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: format!("error from {}", rendered),
                    timed_out: false,
                });
            }
            if rendered == "cargo build --release" {
                if let Some(binary) = &self.binary {
                    std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
                    std::fs::write(binary, b"\x7fELF fake").unwrap();
                }
            }
            Ok(CommandOutput::exited(0))
        }
    }

    fn setup(runner: ScriptedRunner) -> (tempfile::TempDir, PipelineConfig, Arc<ScriptedRunner>) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new("seeker");
        config.source_dir = dir.path().to_path_buf();
        let runner = Arc::new(ScriptedRunner {
            binary: Some(config.build_output()),
            ..runner
        });
        (dir, config, runner)
    }

    #[tokio::test]
    async fn test_all_steps_succeed() {
        let (_dir, config, runner) = setup(ScriptedRunner::default());
        let service = StandardExecutionService::new(runner.clone());

        let report = service.execute_variant(&config, &Variant::linux()).await;

        assert_eq!(report.state, VariantState::Done);
        assert!(report.succeeded());
        assert_eq!(report.steps.len(), StepKind::ALL.len());
        assert!(report.steps.iter().all(|s| s.succeeded()));

        let artifact = report.artifact.unwrap();
        assert_eq!(artifact.file_name, "seeker-linux");
        assert!(artifact.path.is_file());
        assert_eq!(artifact.path, config.artifact_path().join("seeker-linux"));

        assert_eq!(
            report.history,
            vec![
                VariantState::Pending,
                VariantState::Installing,
                VariantState::Formatting,
                VariantState::Linting,
                VariantState::Testing,
                VariantState::Building,
                VariantState::Stripping,
                VariantState::Compressing,
                VariantState::Collected,
                VariantState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_each_failing_step_maps_to_its_kind() {
        let cases = [
            ("rustup", StepKind::InstallToolchain, FailureKind::ToolchainUnavailable),
            ("apt-get", StepKind::InstallCompressor, FailureKind::ToolchainUnavailable),
            ("cargo fmt", StepKind::FormatCheck, FailureKind::FormatViolation),
            ("cargo clippy", StepKind::Lint, FailureKind::LintViolation),
            ("cargo test", StepKind::Test, FailureKind::TestFailure),
            ("cargo build", StepKind::Build, FailureKind::BuildFailure),
            ("strip ", StepKind::Strip, FailureKind::PostProcessFailure),
            ("upx --best", StepKind::Compress, FailureKind::PostProcessFailure),
        ];

        for (pattern, step, kind) in cases {
            let (_dir, config, runner) = setup(ScriptedRunner {
                fail_when: Some(pattern.to_string()),
                ..Default::default()
            });
            let service = StandardExecutionService::new(runner.clone());

            let report = service.execute_variant(&config, &Variant::linux()).await;

            assert_eq!(report.failure(), Some(kind), "failing on {}", pattern);
            assert!(report.artifact.is_none(), "failing on {}", pattern);
            assert_eq!(report.failed_step().unwrap().step, step);
            assert!(
                !config.artifact_path().join("seeker-linux").exists(),
                "failing on {}",
                pattern
            );
            assert!(
                report.failed_step().unwrap().output.contains("error from"),
                "output captured for {}",
                pattern
            );
        }
    }

    #[tokio::test]
    async fn test_failure_halts_later_steps() {
        let (_dir, config, runner) = setup(ScriptedRunner {
            fail_when: Some("cargo clippy".to_string()),
            ..Default::default()
        });
        let service = StandardExecutionService::new(runner.clone());

        let report = service.execute_variant(&config, &Variant::linux()).await;

        assert_eq!(report.failure(), Some(FailureKind::LintViolation));
        assert_eq!(report.steps.len(), 5);
        let calls = runner.calls();
        assert_eq!(calls.last().unwrap(), "cargo clippy --all");
        assert!(!calls.iter().any(|c| c.starts_with("cargo test")));
        assert_eq!(
            report.history.last(),
            Some(&VariantState::Failed(FailureKind::LintViolation))
        );
    }

    #[tokio::test]
    async fn test_artifact_dir_failure_is_toolchain_unavailable() {
        let (_dir, config, runner) = setup(ScriptedRunner::default());
        // A plain file where the directory should go
        std::fs::write(config.artifact_path(), b"not a dir").unwrap();
        let service = StandardExecutionService::new(runner.clone());

        let report = service.execute_variant(&config, &Variant::osx()).await;

        assert_eq!(report.failure(), Some(FailureKind::ToolchainUnavailable));
        assert_eq!(report.failed_step().unwrap().step, StepKind::PrepareArtifactDir);
        assert!(!runner.calls().iter().any(|c| c.starts_with("cargo")));
    }

    #[tokio::test]
    async fn test_existing_artifact_dir_is_fine() {
        let (_dir, config, runner) = setup(ScriptedRunner::default());
        std::fs::create_dir_all(config.artifact_path()).unwrap();
        let service = StandardExecutionService::new(runner);

        let report = service.execute_variant(&config, &Variant::osx()).await;
        assert!(report.succeeded());
    }

    #[tokio::test]
    async fn test_missing_build_output_fails_collect() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new("seeker");
        config.source_dir = dir.path().to_path_buf();
        let service = StandardExecutionService::new(Arc::new(ScriptedRunner::default()));

        let report = service.execute_variant(&config, &Variant::osx()).await;

        assert_eq!(report.failure(), Some(FailureKind::PostProcessFailure));
        assert_eq!(report.failed_step().unwrap().step, StepKind::Collect);
        assert!(report.failed_step().unwrap().exit_code.is_none());
    }

    #[tokio::test]
    async fn test_spawn_error_fails_step() {
        let (_dir, config, runner) = setup(ScriptedRunner {
            refuse_spawn: true,
            ..Default::default()
        });
        let service = StandardExecutionService::new(runner);

        let report = service.execute_variant(&config, &Variant::linux()).await;

        assert_eq!(report.failure(), Some(FailureKind::ToolchainUnavailable));
        let failed = report.failed_step().unwrap();
        assert!(failed.exit_code.is_none());
        assert!(failed.output.contains("No such file"));
    }

    #[tokio::test]
    async fn test_timeout_fails_with_step_kind() {
        let (_dir, mut config, runner) = setup(ScriptedRunner {
            time_out_when: Some("cargo test".to_string()),
            ..Default::default()
        });
        config.step_timeout_seconds = 7;
        let service = StandardExecutionService::new(runner.clone());

        let report = service.execute_variant(&config, &Variant::linux()).await;

        assert_eq!(report.failure(), Some(FailureKind::TestFailure));
        assert!(report.failed_step().unwrap().timed_out);
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.last().unwrap().timeout, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_steps_receive_passthrough_env() {
        let (_dir, config, runner) = setup(ScriptedRunner::default());
        let service = StandardExecutionService::new(runner.clone());

        service.execute_variant(&config, &Variant::linux()).await;

        let calls = runner.calls.lock().unwrap();
        assert!(!calls.is_empty());
        for call in calls.iter() {
            assert_eq!(call.env.get("DNS"), Some(&config.resolver_address));
            assert_eq!(call.env.get("OPENSSL_STATIC"), Some(&"yes".to_string()));
            assert_eq!(call.cwd, config.source_dir);
        }
    }

    #[tokio::test]
    async fn test_logs_carry_failure_output() {
        let (_dir, config, runner) = setup(ScriptedRunner {
            fail_when: Some("cargo fmt".to_string()),
            ..Default::default()
        });
        let service = StandardExecutionService::new(runner);

        let report = service.execute_variant(&config, &Variant::osx()).await;

        assert!(
            report
                .logs
                .iter()
                .any(|l| l.level == LogLevel::Error && l.message.contains("error from cargo fmt"))
        );
    }
}
