//! Step domain types
//!
//! Steps are the gated stages of a variant run. Each one either succeeds and
//! lets the next step run, or fails and ends the variant.

use serde::{Deserialize, Serialize};

use super::outcome::FailureKind;

/// An external command: program plus arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The gated steps of a variant run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    InstallToolchain,
    InstallCompressor,
    PrepareArtifactDir,
    FormatCheck,
    Lint,
    Test,
    Build,
    Strip,
    Compress,
    Collect,
}

impl StepKind {
    /// Every step, in execution order
    pub const ALL: [StepKind; 10] = [
        StepKind::InstallToolchain,
        StepKind::InstallCompressor,
        StepKind::PrepareArtifactDir,
        StepKind::FormatCheck,
        StepKind::Lint,
        StepKind::Test,
        StepKind::Build,
        StepKind::Strip,
        StepKind::Compress,
        StepKind::Collect,
    ];

    /// Stable identifier used in logs and reports
    pub fn id(self) -> &'static str {
        match self {
            StepKind::InstallToolchain => "install-toolchain",
            StepKind::InstallCompressor => "install-compressor",
            StepKind::PrepareArtifactDir => "prepare-artifact-dir",
            StepKind::FormatCheck => "format-check",
            StepKind::Lint => "lint",
            StepKind::Test => "test",
            StepKind::Build => "build",
            StepKind::Strip => "strip",
            StepKind::Compress => "compress",
            StepKind::Collect => "collect",
        }
    }

    /// Failure recorded when this step does not succeed
    pub fn failure_kind(self) -> FailureKind {
        match self {
            StepKind::InstallToolchain
            | StepKind::InstallCompressor
            | StepKind::PrepareArtifactDir => FailureKind::ToolchainUnavailable,
            StepKind::FormatCheck => FailureKind::FormatViolation,
            StepKind::Lint => FailureKind::LintViolation,
            StepKind::Test => FailureKind::TestFailure,
            StepKind::Build => FailureKind::BuildFailure,
            StepKind::Strip | StepKind::Compress | StepKind::Collect => {
                FailureKind::PostProcessFailure
            }
        }
    }

    /// Variant state while this step runs
    ///
    /// `Collect` has no state of its own: the variant stays in `Compressing`
    /// until the copy lands and then moves to `Collected`.
    pub fn state(self) -> Option<VariantState> {
        match self {
            StepKind::InstallToolchain
            | StepKind::InstallCompressor
            | StepKind::PrepareArtifactDir => Some(VariantState::Installing),
            StepKind::FormatCheck => Some(VariantState::Formatting),
            StepKind::Lint => Some(VariantState::Linting),
            StepKind::Test => Some(VariantState::Testing),
            StepKind::Build => Some(VariantState::Building),
            StepKind::Strip => Some(VariantState::Stripping),
            StepKind::Compress => Some(VariantState::Compressing),
            StepKind::Collect => None,
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.id())
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: StepKind,
    /// Process exit code; `None` when the step never produced one (spawn
    /// error, signal, native I/O failure). Native steps report 0 on success.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Captured stdout and stderr
    pub output: String,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Last `lines` lines of the captured output
    pub fn output_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.output.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Variant state machine
///
/// `Pending → Installing → Formatting → Linting → Testing → Building →
/// Stripping → Compressing → Collected → Done`. Any state may move to
/// `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantState {
    Pending,
    Installing,
    Formatting,
    Linting,
    Testing,
    Building,
    Stripping,
    Compressing,
    Collected,
    Done,
    Failed(FailureKind),
}

impl VariantState {
    pub fn is_terminal(self) -> bool {
        matches!(self, VariantState::Done | VariantState::Failed(_))
    }
}

impl std::fmt::Display for VariantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantState::Failed(kind) => write!(f, "Failed({})", kind),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_per_step() {
        assert_eq!(
            StepKind::InstallCompressor.failure_kind(),
            FailureKind::ToolchainUnavailable
        );
        assert_eq!(StepKind::FormatCheck.failure_kind(), FailureKind::FormatViolation);
        assert_eq!(StepKind::Lint.failure_kind(), FailureKind::LintViolation);
        assert_eq!(StepKind::Test.failure_kind(), FailureKind::TestFailure);
        assert_eq!(StepKind::Build.failure_kind(), FailureKind::BuildFailure);
        assert_eq!(StepKind::Compress.failure_kind(), FailureKind::PostProcessFailure);
    }

    #[test]
    fn test_command_display() {
        let cmd = CommandSpec::new("cargo").args(["fmt", "--all", "--", "--check"]);
        assert_eq!(cmd.to_string(), "cargo fmt --all -- --check");
    }

    #[test]
    fn test_step_result_success_requires_zero_exit() {
        let mut result = StepResult {
            step: StepKind::Test,
            exit_code: Some(0),
            timed_out: false,
            output: String::new(),
            duration_ms: 5,
        };
        assert!(result.succeeded());

        result.exit_code = Some(101);
        assert!(!result.succeeded());

        result.exit_code = None;
        assert!(!result.succeeded());

        result.exit_code = Some(0);
        result.timed_out = true;
        assert!(!result.succeeded());
    }

    #[test]
    fn test_output_tail() {
        let result = StepResult {
            step: StepKind::Build,
            exit_code: Some(1),
            timed_out: false,
            output: "one\ntwo\nthree\nfour".to_string(),
            duration_ms: 0,
        };
        assert_eq!(result.output_tail(2), "three\nfour");
        assert_eq!(result.output_tail(10), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn test_terminal_states() {
        assert!(VariantState::Done.is_terminal());
        assert!(VariantState::Failed(FailureKind::BuildFailure).is_terminal());
        assert!(!VariantState::Collected.is_terminal());
        assert!(!VariantState::Pending.is_terminal());
    }
}
