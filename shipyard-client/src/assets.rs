//! Asset upload endpoint

use crate::ReleaseClient;
use crate::error::{ClientError, Result};
use reqwest::header::CONTENT_TYPE;
use shipyard_core::dto::release::{Release, ReleaseAsset};
use tracing::debug;

impl ReleaseClient {
    /// Upload a file as a release asset
    ///
    /// # Arguments
    /// * `release` - Release returned by `create_release`; its upload URL is used
    /// * `name` - Asset file name as it will appear on the release
    /// * `contents` - Raw file bytes
    pub async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        contents: Vec<u8>,
    ) -> Result<ReleaseAsset> {
        if name.is_empty() {
            return Err(ClientError::InvalidRequest(
                "asset name cannot be empty".to_string(),
            ));
        }

        let url = release.upload_endpoint();
        debug!(
            "Uploading asset {} ({} bytes) to release {}",
            name,
            contents.len(),
            release.id
        );

        let response = self
            .authorize(self.client.post(url))
            .query(&[("name", name)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(contents)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
