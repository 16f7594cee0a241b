//! Publish Service
//!
//! Uploads the artifacts of a successful run to a draft release. The new
//! draft is filled completely before anything already published is touched:
//! the release previously holding the tag is deleted only after every upload
//! succeeded, and a failed publish removes its own draft again. A rerun
//! therefore either replaces the whole release or leaves the old one intact.

use async_trait::async_trait;
use shipyard_client::{ClientError, ReleaseHost};
use shipyard_core::domain::artifact::Artifact;
use shipyard_core::domain::release::{PublishedRelease, ReleaseDescriptor};
use shipyard_core::dto::release::{CreateRelease, Release};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors raised by the publish stage
#[derive(Debug, Error)]
pub enum PublishError {
    /// Publishing needs settings the run does not have
    #[error("Publishing is not configured: {0}")]
    NotConfigured(String),

    /// The artifact glob is malformed
    #[error("Invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// An artifact could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the artifacts matched the release's file glob
    #[error("No artifacts matching '{0}'")]
    NoArtifacts(String),

    /// A release with the tag exists and overwrite is off
    #[error("Release with tag '{0}' already exists")]
    ReleaseExists(String),

    /// The release API rejected a call
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Keeps the artifacts whose file names match `pattern`, sorted by name
pub fn select_artifacts<'a>(
    artifacts: &'a [Artifact],
    pattern: &str,
) -> Result<Vec<&'a Artifact>, PublishError> {
    let pattern = glob::Pattern::new(pattern)?;

    let mut selected: Vec<&Artifact> = artifacts
        .iter()
        .filter(|artifact| {
            let matched = pattern.matches(&artifact.file_name);
            if !matched {
                warn!(
                    "Artifact {} does not match '{}'; not publishing it",
                    artifact.file_name, pattern
                );
            }
            matched
        })
        .collect();

    selected.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(selected)
}

/// Service trait for the publish stage
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `artifacts` (those matching the descriptor's glob) as one
    /// release
    async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
        artifacts: &[Artifact],
    ) -> Result<PublishedRelease, PublishError>;
}

/// Publisher backed by a release host
pub struct ReleasePublisher {
    host: Arc<dyn ReleaseHost>,
}

impl ReleasePublisher {
    pub fn new(host: Arc<dyn ReleaseHost>) -> Self {
        Self { host }
    }

    /// Uploads every artifact to `release`, returning the asset names
    async fn upload_all(
        &self,
        release: &Release,
        artifacts: &[&Artifact],
    ) -> Result<Vec<String>, PublishError> {
        let mut assets = Vec::with_capacity(artifacts.len());

        for artifact in artifacts {
            let contents = tokio::fs::read(&artifact.path)
                .await
                .map_err(|e| PublishError::Io {
                    path: artifact.path.clone(),
                    source: e,
                })?;

            let asset = self
                .host
                .upload_asset(release, &artifact.file_name, contents)
                .await?;
            info!("Uploaded {} ({} bytes)", asset.name, asset.size);
            assets.push(asset.name);
        }

        Ok(assets)
    }

    /// Deletes a draft this publish created, after a later step failed
    async fn discard(&self, release: &Release) {
        warn!("Discarding incomplete release {}", release.id);
        if let Err(e) = self.host.delete_release(release.id).await {
            error!(
                "Failed to discard incomplete release {}: {}",
                release.id, e
            );
        }
    }
}

#[async_trait]
impl Publisher for ReleasePublisher {
    async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
        artifacts: &[Artifact],
    ) -> Result<PublishedRelease, PublishError> {
        let selected = select_artifacts(artifacts, &descriptor.file_glob)?;
        if selected.is_empty() {
            return Err(PublishError::NoArtifacts(descriptor.file_glob.clone()));
        }

        debug!("Publishing {} artifact(s)", selected.len());

        let existing = self.host.find_release_by_tag(&descriptor.tag).await?;
        if existing.is_some() && !descriptor.overwrite {
            return Err(PublishError::ReleaseExists(descriptor.tag.clone()));
        }

        let release = self
            .host
            .create_release(CreateRelease {
                tag_name: descriptor.tag.clone(),
                name: descriptor.name.clone(),
                draft: descriptor.draft,
                prerelease: false,
                target_commitish: None,
            })
            .await?;

        info!(
            "Created release {} '{}' (tag: {})",
            release.id, descriptor.name, release.tag_name
        );

        let assets = match self.upload_all(&release, &selected).await {
            Ok(assets) => assets,
            Err(e) => {
                self.discard(&release).await;
                return Err(e);
            }
        };

        let replaced = match existing {
            Some(old) => {
                info!(
                    "Replacing release {} tagged '{}' with {}",
                    old.id, descriptor.tag, release.id
                );
                if let Err(e) = self.host.delete_release(old.id).await {
                    // Two releases must not share the tag; keep the old one
                    self.discard(&release).await;
                    return Err(e.into());
                }
                Some(old.id)
            }
            None => None,
        };

        Ok(PublishedRelease {
            id: release.id,
            tag: release.tag_name,
            name: release.name.unwrap_or_else(|| descriptor.name.clone()),
            url: release.html_url,
            assets,
            replaced,
        })
    }
}
