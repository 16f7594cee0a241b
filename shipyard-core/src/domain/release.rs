//! Release domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pipeline::PipelineConfig;

/// Tag every published release carries
///
/// The incoming git tag is discarded and replaced by this value, so repeated
/// runs keep overwriting a single draft.
pub const PREVIEW_TAG: &str = "preview";

/// Timestamp layout used in release names
pub const RELEASE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything needed to publish one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub tag: String,
    /// `<commit>@<YYYY-MM-DD HH:MM:SS>`
    pub name: String,
    pub draft: bool,
    /// Replace any release already carrying `tag`
    pub overwrite: bool,
    /// Selects the files to upload from the artifact directory
    pub file_glob: String,
}

impl ReleaseDescriptor {
    /// Computes the descriptor for a commit at a given instant
    pub fn compute(config: &PipelineConfig, commit: &str, now: DateTime<Utc>) -> Self {
        Self {
            tag: PREVIEW_TAG.to_string(),
            name: release_name(commit, now),
            draft: true,
            overwrite: true,
            file_glob: config.artifact_glob(),
        }
    }
}

/// Formats a release name from a commit identifier and a timestamp
pub fn release_name(commit: &str, now: DateTime<Utc>) -> String {
    format!("{}@{}", commit, now.format(RELEASE_TIME_FORMAT))
}

/// A release as it exists on the hosting side after publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRelease {
    pub id: u64,
    pub tag: String,
    pub name: String,
    pub url: String,
    /// Uploaded asset names
    pub assets: Vec<String>,
    /// Id of the release this one replaced, if any
    pub replaced: Option<u64>,
}
