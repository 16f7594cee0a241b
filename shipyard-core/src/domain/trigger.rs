//! Trigger domain types

use serde::{Deserialize, Serialize};

/// The event that started a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Branch the event occurred on
    pub branch: String,

    /// Whether the event's tag value was blank
    pub tag_blank: bool,

    /// Commit identifier, used in the release name
    pub commit: String,
}

impl Trigger {
    /// Builds a trigger from the raw tag value; whitespace-only counts as blank
    pub fn new(branch: impl Into<String>, tag: Option<&str>, commit: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            tag_blank: tag.is_none_or(|t| t.trim().is_empty()),
            commit: commit.into(),
        }
    }
}
