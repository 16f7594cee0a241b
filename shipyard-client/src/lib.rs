//! Shipyard HTTP Client
//!
//! A small, type-safe client for the release-hosting API (GitHub Releases
//! REST shape). The orchestrator's publish stage talks to the hosting side
//! exclusively through the [`ReleaseHost`] trait, which this client implements.
//!
//! # Example
//!
//! ```no_run
//! use shipyard_client::{ReleaseClient, ReleaseHost};
//! use shipyard_core::domain::pipeline::Secret;
//!
//! #[tokio::main]
//! async fn main() -> shipyard_client::Result<()> {
//!     let client = ReleaseClient::new(
//!         "https://api.github.com",
//!         "gfreezy/seeker",
//!         Secret::new("token"),
//!     );
//!
//!     if let Some(release) = client.find_release_by_tag("preview").await? {
//!         println!("Existing release: {}", release.id);
//!     }
//!     Ok(())
//! }
//! ```

mod assets;
pub mod error;
mod host;
mod releases;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use host::ReleaseHost;

use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use shipyard_core::domain::pipeline::Secret;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("shipyard/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the release-hosting API
///
/// Every request is scoped to one repository and authenticated with the
/// pipeline's credential as a bearer token.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    /// Base URL of the API (e.g., "https://api.github.com")
    base_url: String,
    /// `owner/name` of the repository
    repository: String,
    token: Secret,
    /// HTTP client instance
    client: Client,
}

impl ReleaseClient {
    /// Create a new release client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API
    /// * `repository` - `owner/name` of the repository that hosts releases
    /// * `token` - The API credential
    pub fn new(
        base_url: impl Into<String>,
        repository: impl Into<String>,
        token: Secret,
    ) -> Self {
        Self::with_client(base_url, repository, token, Client::new())
    }

    /// Create a new release client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        repository: impl Into<String>,
        token: Secret,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.into().trim_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the repository releases are published to
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// URL of the repository's release collection
    fn releases_url(&self) -> String {
        format!("{}/repos/{}/releases", self.base_url, self.repository)
    }

    /// Applies the headers every request carries
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.token.expose())
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&error_text),
            ));
        }

        Ok(())
    }
}

/// Extracts the `message` field of a JSON error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
