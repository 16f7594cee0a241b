//! Publish gating
//!
//! Two gates guard a run. The pipeline gate decides whether the pipeline runs
//! at all (only untagged triggers do). The publish gate decides whether the
//! collected artifacts are released.

use serde::Serialize;
use shipyard_core::domain::trigger::Trigger;

/// What to do with the artifacts once every variant has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishDecision {
    /// The trigger carried a tag; the pipeline does not run
    SkipPipeline,
    /// At least one variant failed
    VariantsFailed,
    /// Every variant succeeded but the branch is not the release branch
    NotOnReleaseBranch,
    Publish,
}

/// Whether the pipeline runs at all for this trigger
pub fn pipeline_enabled(trigger: &Trigger) -> bool {
    trigger.tag_blank
}

/// Whether the trigger's branch is the release branch
pub fn on_target_branch(trigger: &Trigger, target_branch: &str) -> bool {
    trigger.branch == target_branch
}

/// Decides the publish outcome
///
/// The tag gate is checked first, then variant success, then the branch.
pub fn decide(tag_blank: bool, all_succeeded: bool, on_target_branch: bool) -> PublishDecision {
    if !tag_blank {
        PublishDecision::SkipPipeline
    } else if !all_succeeded {
        PublishDecision::VariantsFailed
    } else if !on_target_branch {
        PublishDecision::NotOnReleaseBranch
    } else {
        PublishDecision::Publish
    }
}

/// True iff the run publishes
pub fn should_publish(tag_blank: bool, all_succeeded: bool, on_target_branch: bool) -> bool {
    decide(tag_blank, all_succeeded, on_target_branch) == PublishDecision::Publish
}
