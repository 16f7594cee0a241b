//! Release-related API endpoints

use crate::ReleaseClient;
use crate::error::Result;
use shipyard_core::dto::release::{CreateRelease, Release};
use tracing::debug;

/// Releases requested per listing page
pub(crate) const PAGE_SIZE: usize = 100;

impl ReleaseClient {
    // =============================================================================
    // Release Management
    // =============================================================================

    /// List one page of releases, newest first, drafts included
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    pub async fn list_releases(&self, page: u32) -> Result<Vec<Release>> {
        let url = self.releases_url();
        debug!("Listing releases page {} of {}", page, self.repository);

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("per_page", PAGE_SIZE as u32), ("page", page)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create a release
    ///
    /// # Arguments
    /// * `req` - The release creation request
    ///
    /// # Returns
    /// The created release, including its asset upload URL
    pub async fn create_release(&self, req: CreateRelease) -> Result<Release> {
        let url = self.releases_url();
        debug!(
            "Creating release '{}' (tag {}, draft {})",
            req.name, req.tag_name, req.draft
        );

        let response = self.authorize(self.client.post(&url)).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a release
    ///
    /// # Arguments
    /// * `release_id` - The release to delete; its assets go with it
    pub async fn delete_release(&self, release_id: u64) -> Result<()> {
        let url = format!("{}/{}", self.releases_url(), release_id);
        debug!("Deleting release {}", release_id);

        let response = self.authorize(self.client.delete(&url)).send().await?;

        self.handle_empty_response(response).await
    }
}
