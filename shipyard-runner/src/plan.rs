//! Variant step planning
//!
//! Turns the pipeline configuration into the ordered list of gated steps a
//! variant runs. Planning is pure: nothing is executed here, which is what
//! `shipyard plan` prints.

use serde::Serialize;
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::step::{CommandSpec, StepKind};
use shipyard_core::domain::variant::Variant;
use std::path::PathBuf;

/// Toolchain components the format and lint gates need
pub const TOOLCHAIN_COMPONENTS: [&str; 2] = ["rustfmt", "clippy"];

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Run an external command in the source tree
    Run { command: CommandSpec },
    /// Create a directory and its parents; succeeds if it exists
    CreateDir { path: PathBuf },
    /// Copy a file, replacing the destination
    Copy { from: PathBuf, to: PathBuf },
}

/// One planned step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub kind: StepKind,
    pub action: StepAction,
}

impl Step {
    fn run(kind: StepKind, command: CommandSpec) -> Self {
        Self {
            kind,
            action: StepAction::Run { command },
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action {
            StepAction::Run { command } => write!(f, "{:<22} {}", self.kind, command),
            StepAction::CreateDir { path } => {
                write!(f, "{:<22} mkdir -p {}", self.kind, path.display())
            }
            StepAction::Copy { from, to } => {
                write!(f, "{:<22} cp {} {}", self.kind, from.display(), to.display())
            }
        }
    }
}

/// Plans every step of a variant run, in execution order
pub fn plan_variant(config: &PipelineConfig, variant: &Variant) -> Vec<Step> {
    let binary = config.build_output();
    let binary_arg = binary.to_string_lossy().into_owned();

    vec![
        Step::run(
            StepKind::InstallToolchain,
            CommandSpec::new("rustup")
                .args(["component", "add"])
                .args(TOOLCHAIN_COMPONENTS),
        ),
        Step::run(StepKind::InstallCompressor, variant.compressor_install.clone()),
        Step {
            kind: StepKind::PrepareArtifactDir,
            action: StepAction::CreateDir {
                path: config.artifact_path(),
            },
        },
        Step::run(
            StepKind::FormatCheck,
            CommandSpec::new("cargo").args(["fmt", "--all", "--", "--check"]),
        ),
        Step::run(
            StepKind::Lint,
            CommandSpec::new("cargo").args(["clippy", "--all"]),
        ),
        Step::run(
            StepKind::Test,
            CommandSpec::new("cargo").args(["test", "--all"]),
        ),
        Step::run(
            StepKind::Build,
            CommandSpec::new("cargo").args(["build", "--release"]),
        ),
        Step::run(StepKind::Strip, CommandSpec::new("strip").arg(&binary_arg)),
        Step::run(
            StepKind::Compress,
            CommandSpec::new("upx").arg("--best").arg(&binary_arg),
        ),
        Step {
            kind: StepKind::Collect,
            action: StepAction::Copy {
                from: binary,
                to: config.artifact_path().join(config.artifact_name(variant)),
            },
        },
    ]
}
