use serde::{Deserialize, Serialize};

/// Request body for creating a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRelease {
    pub tag_name: String,
    pub name: String,
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
}

/// A release as returned by the hosting API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub draft: bool,
    #[serde(default)]
    pub html_url: String,
    /// RFC 6570 template, e.g. `https://uploads.github.com/.../assets{?name,label}`
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Upload endpoint with the URI template suffix removed
    pub fn upload_endpoint(&self) -> &str {
        self.upload_url
            .split_once('{')
            .map(|(base, _)| base)
            .unwrap_or(&self.upload_url)
    }
}

/// A file attached to a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: String,
}
