//! Release host abstraction

use async_trait::async_trait;
use shipyard_core::dto::release::{CreateRelease, Release, ReleaseAsset};

use crate::error::Result;

/// Operations the publish stage needs from a release-hosting service
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Finds the release carrying `tag`, drafts included
    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>>;

    /// Deletes a release and its assets
    async fn delete_release(&self, release_id: u64) -> Result<()>;

    /// Creates a release
    async fn create_release(&self, req: CreateRelease) -> Result<Release>;

    /// Uploads one file as an asset of `release`
    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        contents: Vec<u8>,
    ) -> Result<ReleaseAsset>;
}

#[async_trait]
impl ReleaseHost for crate::ReleaseClient {
    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        // Drafts have no git tag yet, so the by-tag endpoint never returns
        // them; walk the listing instead.
        let mut page = 1;
        loop {
            let releases = crate::ReleaseClient::list_releases(self, page).await?;
            if let Some(found) = releases.iter().find(|r| r.tag_name == tag) {
                return Ok(Some(found.clone()));
            }
            if releases.len() < crate::releases::PAGE_SIZE {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn delete_release(&self, release_id: u64) -> Result<()> {
        crate::ReleaseClient::delete_release(self, release_id).await
    }

    async fn create_release(&self, req: CreateRelease) -> Result<Release> {
        crate::ReleaseClient::create_release(self, req).await
    }

    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        contents: Vec<u8>,
    ) -> Result<ReleaseAsset> {
        crate::ReleaseClient::upload_asset(self, release, name, contents).await
    }
}
