//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::variant::Variant;

/// Default DNS resolver handed to every external step
pub const DEFAULT_RESOLVER: &str = "114.114.114.114";

/// Default branch whose builds are published
pub const DEFAULT_TARGET_BRANCH: &str = "master";

/// Default release API base URL
pub const DEFAULT_RELEASE_API_URL: &str = "https://api.github.com";

/// Environment variables toggling static linking of native dependencies
pub const STATIC_LINK_TOGGLES: [&str; 3] = ["OPENSSL_STATIC", "SODIUM_STATIC", "SODIUM_BUILD_STATIC"];

/// Environment variable carrying the resolver address into every step
pub const RESOLVER_ENV: &str = "DNS";

/// Pipeline configuration
///
/// Resolved once per run and never mutated afterwards. Shared read-only
/// between the variant runs and the publish stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the binary being built; also the artifact base name
    pub binary_name: String,

    /// Static-link toggles, passed through to every step unmodified
    pub static_link: BTreeMap<String, String>,

    /// Resolver address, passed through as `DNS`
    pub resolver_address: String,

    /// Only builds on this branch are published
    pub target_branch: String,

    /// Release API credential
    #[serde(skip)]
    pub credential: Option<Secret>,

    /// `owner/name` of the repository that hosts releases
    pub release_repository: Option<String>,

    /// Base URL of the release API
    pub release_api_url: String,

    /// Root of the source tree the tools run in
    pub source_dir: PathBuf,

    /// Directory collecting per-variant artifacts, relative to `source_dir`
    /// unless absolute
    pub artifact_dir: PathBuf,

    /// Wall-clock limit for a single step
    pub step_timeout_seconds: u64,

    /// Variants to build
    pub variants: Vec<Variant>,
}

impl PipelineConfig {
    /// Creates a configuration with defaults for everything but the binary name
    pub fn new(binary_name: impl Into<String>) -> Self {
        let static_link = STATIC_LINK_TOGGLES
            .iter()
            .map(|name| (name.to_string(), "yes".to_string()))
            .collect();

        Self {
            binary_name: binary_name.into(),
            static_link,
            resolver_address: DEFAULT_RESOLVER.to_string(),
            target_branch: DEFAULT_TARGET_BRANCH.to_string(),
            credential: None,
            release_repository: None,
            release_api_url: DEFAULT_RELEASE_API_URL.to_string(),
            source_dir: PathBuf::from("."),
            artifact_dir: PathBuf::from("dist"),
            step_timeout_seconds: 3600,
            variants: Variant::defaults(),
        }
    }

    /// Per-step timeout
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_seconds)
    }

    /// Environment handed to every external step
    pub fn passthrough_env(&self) -> BTreeMap<String, String> {
        let mut env = self.static_link.clone();
        env.insert(RESOLVER_ENV.to_string(), self.resolver_address.clone());
        env
    }

    /// Resolved artifact directory
    pub fn artifact_path(&self) -> PathBuf {
        if self.artifact_dir.is_absolute() {
            self.artifact_dir.clone()
        } else {
            self.source_dir.join(&self.artifact_dir)
        }
    }

    /// Path of the binary produced by the release build
    pub fn build_output(&self) -> PathBuf {
        self.source_dir
            .join("target")
            .join("release")
            .join(&self.binary_name)
    }

    /// Artifact file name for a variant: `<binary>-<os>`
    pub fn artifact_name(&self, variant: &Variant) -> String {
        format!("{}-{}", self.binary_name, variant.os)
    }

    /// Glob selecting every variant's artifact
    pub fn artifact_glob(&self) -> String {
        format!("{}-*", self.binary_name)
    }

    /// Returns a copy with a different credential
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(Secret::new(credential));
        self
    }

    /// Returns a copy building only the given variants
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }
}

/// An opaque credential
///
/// Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value for use in an outbound request
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(****)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "****")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::new("seeker");
        assert_eq!(config.target_branch, "master");
        assert_eq!(config.step_timeout(), Duration::from_secs(3600));
        assert_eq!(config.variants.len(), 2);
        assert_eq!(config.static_link.len(), 3);
        assert!(config.credential.is_none());
    }

    #[test]
    fn test_passthrough_env_includes_toggles_and_resolver() {
        let config = PipelineConfig::new("seeker");
        let env = config.passthrough_env();

        assert_eq!(env.get("OPENSSL_STATIC"), Some(&"yes".to_string()));
        assert_eq!(env.get("SODIUM_STATIC"), Some(&"yes".to_string()));
        assert_eq!(env.get("SODIUM_BUILD_STATIC"), Some(&"yes".to_string()));
        assert_eq!(env.get("DNS"), Some(&DEFAULT_RESOLVER.to_string()));
    }

    #[test]
    fn test_artifact_naming() {
        let config = PipelineConfig::new("seeker");
        let names: Vec<String> = config
            .variants
            .iter()
            .map(|v| config.artifact_name(v))
            .collect();

        assert_eq!(names, vec!["seeker-osx", "seeker-linux"]);
        assert_eq!(config.artifact_glob(), "seeker-*");
    }

    #[test]
    fn test_paths_resolve_against_source_dir() {
        let mut config = PipelineConfig::new("seeker");
        config.source_dir = PathBuf::from("/src");

        assert_eq!(config.artifact_path(), PathBuf::from("/src/dist"));
        assert_eq!(
            config.build_output(),
            PathBuf::from("/src/target/release/seeker")
        );

        config.artifact_dir = PathBuf::from("/tmp/out");
        assert_eq!(config.artifact_path(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = PipelineConfig::new("seeker").with_credential("ghp_topsecret");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("ghp_topsecret"));
        assert!(debug.contains("Secret(****)"));
        assert_eq!(config.credential.unwrap().expose(), "ghp_topsecret");
    }
}
