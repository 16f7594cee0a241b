//! Artifact domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::pipeline::PipelineConfig;
use super::variant::Variant;

/// The stripped, compressed binary produced by one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// OS identifier of the variant that produced it
    pub os: String,

    /// Location inside the artifact directory
    pub path: PathBuf,

    /// `<binary>-<os>`
    pub file_name: String,
}

impl Artifact {
    /// Describes where a variant's artifact lands
    pub fn for_variant(config: &PipelineConfig, variant: &Variant) -> Self {
        let file_name = config.artifact_name(variant);
        Self {
            os: variant.os.clone(),
            path: config.artifact_path().join(&file_name),
            file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_for_variant() {
        let config = PipelineConfig::new("seeker");
        let artifact = Artifact::for_variant(&config, &Variant::linux());

        assert_eq!(artifact.os, "linux");
        assert_eq!(artifact.file_name, "seeker-linux");
        assert_eq!(artifact.path, PathBuf::from("./dist/seeker-linux"));
    }
}
