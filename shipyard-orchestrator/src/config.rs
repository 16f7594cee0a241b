//! Pipeline configuration loading
//!
//! Resolves a `PipelineConfig` from environment variables, falling back to
//! defaults for everything except the binary name.
//!
//! Recognized variables:
//! - BINARY_NAME (required)
//! - OPENSSL_STATIC, SODIUM_STATIC, SODIUM_BUILD_STATIC (optional, default: yes)
//! - DNS (optional, default: 114.114.114.114)
//! - RELEASE_BRANCH (optional, default: master)
//! - GITHUB_TOKEN (optional, required to publish)
//! - RELEASE_REPOSITORY (optional, `owner/name`, required to publish)
//! - RELEASE_API_URL (optional, default: https://api.github.com)
//! - SOURCE_DIR (optional, default: .)
//! - ARTIFACT_DIR (optional, default: dist)
//! - STEP_TIMEOUT (optional, seconds, default: 3600)

use anyhow::{Context, Result};
use shipyard_core::domain::pipeline::{PipelineConfig, RESOLVER_ENV, STATIC_LINK_TOGGLES, Secret};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Loads and validates the configuration from the process environment
pub fn load_config() -> Result<PipelineConfig> {
    let config = from_env()?;
    validate(&config)?;

    info!(
        "Loaded configuration: binary={}, target_branch={}, variants={}",
        config.binary_name,
        config.target_branch,
        config.variants.len()
    );

    Ok(config)
}

/// Builds a configuration from the process environment
pub fn from_env() -> Result<PipelineConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Builds a configuration from an arbitrary variable lookup
///
/// Empty values count as unset.
pub fn from_lookup<F>(lookup: F) -> Result<PipelineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let binary_name = get("BINARY_NAME")
        .ok_or_else(|| anyhow::anyhow!("BINARY_NAME environment variable not set"))?;

    let mut config = PipelineConfig::new(binary_name);

    for toggle in STATIC_LINK_TOGGLES {
        if let Some(value) = get(toggle) {
            config.static_link.insert(toggle.to_string(), value);
        }
    }

    if let Some(resolver) = get(RESOLVER_ENV) {
        config.resolver_address = resolver;
    }

    if let Some(branch) = get("RELEASE_BRANCH") {
        config.target_branch = branch;
    }

    config.credential = get("GITHUB_TOKEN").map(Secret::new);
    config.release_repository = get("RELEASE_REPOSITORY");

    if let Some(url) = get("RELEASE_API_URL") {
        config.release_api_url = url;
    }

    if let Some(dir) = get("SOURCE_DIR") {
        config.source_dir = PathBuf::from(dir);
    }

    if let Some(dir) = get("ARTIFACT_DIR") {
        config.artifact_dir = PathBuf::from(dir);
    }

    if let Some(timeout) = get("STEP_TIMEOUT") {
        config.step_timeout_seconds = timeout
            .trim()
            .parse::<u64>()
            .with_context(|| {
                format!("STEP_TIMEOUT must be a number of seconds, got '{}'", timeout)
            })?;
    }

    Ok(config)
}

/// Validates the configuration
pub fn validate(config: &PipelineConfig) -> Result<()> {
    if config.binary_name.is_empty() {
        anyhow::bail!("binary_name cannot be empty");
    }

    if config.binary_name.contains(['/', '\\']) || config.binary_name.contains(char::is_whitespace)
    {
        anyhow::bail!(
            "binary_name '{}' must not contain path separators or whitespace",
            config.binary_name
        );
    }

    if config.target_branch.is_empty() {
        anyhow::bail!("target_branch cannot be empty");
    }

    if !config.release_api_url.starts_with("http://")
        && !config.release_api_url.starts_with("https://")
    {
        anyhow::bail!("release_api_url must start with http:// or https://");
    }

    if config.step_timeout_seconds == 0 {
        anyhow::bail!("step_timeout must be greater than 0");
    }

    if config.variants.is_empty() {
        anyhow::bail!("at least one variant is required");
    }

    // Artifact names are keyed by OS identifier; duplicates would overwrite
    // each other in the shared artifact directory.
    let mut seen = HashSet::new();
    for variant in &config.variants {
        if variant.os.is_empty() {
            anyhow::bail!("variant '{}' has an empty OS identifier", variant.name);
        }
        if !seen.insert(variant.os.as_str()) {
            anyhow::bail!("duplicate variant OS identifier '{}'", variant.os);
        }
    }

    Ok(())
}

/// Checks the settings only the publish stage needs
pub fn validate_for_publish(config: &PipelineConfig) -> Result<(&Secret, &str)> {
    let credential = config
        .credential
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("GITHUB_TOKEN is not set; cannot publish"))?;

    let repository = config
        .release_repository
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("RELEASE_REPOSITORY is not set; cannot publish"))?;

    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((credential, repository))
        }
        _ => anyhow::bail!(
            "RELEASE_REPOSITORY must be 'owner/name', got '{}'",
            repository
        ),
    }
}
