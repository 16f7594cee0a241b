//! Outcome domain types
//!
//! What a variant run and the whole pipeline report back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::Artifact;
use super::log::{LogEntry, LogLevel};
use super::release::{PublishedRelease, ReleaseDescriptor};
use super::step::{StepResult, VariantState};
use super::variant::Variant;

/// Why a variant or the publish stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Toolchain, compressor or artifact directory could not be set up
    ToolchainUnavailable,
    FormatViolation,
    LintViolation,
    TestFailure,
    BuildFailure,
    /// Strip, compress or collect failed
    PostProcessFailure,
    PublishFailure,
    /// The variant task panicked or was cancelled before reporting
    Aborted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Final report of one variant run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub run_id: Uuid,
    pub variant: Variant,
    /// Terminal state: `Done` or `Failed`
    pub state: VariantState,
    /// Every state visited, starting at `Pending`
    pub history: Vec<VariantState>,
    /// Results of the steps that ran, in order
    pub steps: Vec<StepResult>,
    /// Present only when the variant reached `Done`
    pub artifact: Option<Artifact>,
    pub logs: Vec<LogEntry>,
}

impl VariantReport {
    /// Report for a variant whose task never returned
    pub fn aborted(variant: Variant, reason: impl Into<String>) -> Self {
        let state = VariantState::Failed(FailureKind::Aborted);
        Self {
            run_id: Uuid::new_v4(),
            variant,
            state,
            history: vec![VariantState::Pending, state],
            steps: Vec::new(),
            artifact: None,
            logs: vec![LogEntry::now(LogLevel::Error, reason)],
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == VariantState::Done && self.artifact.is_some()
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.state {
            VariantState::Failed(kind) => Some(kind),
            _ => None,
        }
    }

    /// The step that ended the run, if it failed
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.last().filter(|step| !step.succeeded())
    }
}

/// Aggregate result of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// The trigger tag was not blank; nothing ran
    SkippedByGate,
    /// At least one variant failed; nothing was published
    VariantsFailed,
    /// Every variant succeeded but the branch is not the release branch;
    /// artifacts stay in the artifact directory
    NotOnReleaseBranch { branch: String, target: String },
    /// The selected variants succeeded but the run covered only part of the
    /// configured variants; publishing waits for the aggregation step
    PublishDeferred { built: Vec<String> },
    Published { release: PublishedRelease },
    PublishFailed { kind: FailureKind, message: String },
}

/// Everything a pipeline run reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub status: PipelineStatus,
    pub variants: Vec<VariantReport>,
    /// Computed only once publishing was decided
    pub release: Option<ReleaseDescriptor>,
}

impl PipelineOutcome {
    pub fn skipped_by_gate() -> Self {
        Self {
            status: PipelineStatus::SkippedByGate,
            variants: Vec::new(),
            release: None,
        }
    }

    /// True when the run ended `Published`, `NotOnReleaseBranch` or
    /// `PublishDeferred`
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            PipelineStatus::Published { .. }
                | PipelineStatus::NotOnReleaseBranch { .. }
                | PipelineStatus::PublishDeferred { .. }
        )
    }

    pub fn is_published(&self) -> bool {
        matches!(self.status, PipelineStatus::Published { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Artifacts produced by the variants that reached `Done`
    pub fn artifacts(&self) -> Vec<&Artifact> {
        self.variants
            .iter()
            .filter_map(|report| report.artifact.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_report() {
        let report = VariantReport::aborted(Variant::osx(), "task panicked");

        assert!(!report.succeeded());
        assert_eq!(report.failure(), Some(FailureKind::Aborted));
        assert!(report.failed_step().is_none());
        assert!(report.artifact.is_none());
    }

    #[test]
    fn test_exit_codes() {
        let skipped = PipelineOutcome::skipped_by_gate();
        assert_eq!(skipped.exit_code(), 1);

        let off_branch = PipelineOutcome {
            status: PipelineStatus::NotOnReleaseBranch {
                branch: "dev".to_string(),
                target: "master".to_string(),
            },
            variants: Vec::new(),
            release: None,
        };
        assert_eq!(off_branch.exit_code(), 0);
        assert!(!off_branch.is_published());

        let failed = PipelineOutcome {
            status: PipelineStatus::PublishFailed {
                kind: FailureKind::PublishFailure,
                message: "401".to_string(),
            },
            variants: Vec::new(),
            release: None,
        };
        assert_eq!(failed.exit_code(), 1);

        let deferred = PipelineOutcome {
            status: PipelineStatus::PublishDeferred {
                built: vec!["osx".to_string()],
            },
            variants: Vec::new(),
            release: None,
        };
        assert_eq!(deferred.exit_code(), 0);
        assert!(!deferred.is_published());
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let json = serde_json::to_value(&PipelineStatus::VariantsFailed).unwrap();
        assert_eq!(json, serde_json::json!({"status": "variants_failed"}));
    }
}
