//! Variant domain model
//!
//! A variant is one target operating system's build-and-release run.

use serde::{Deserialize, Serialize};

use super::step::CommandSpec;

/// A target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Human-readable name
    pub name: String,

    /// OS identifier, used as the artifact suffix
    pub os: String,

    /// Command installing the binary compressor on this OS
    pub compressor_install: CommandSpec,
}

impl Variant {
    pub fn new(
        name: impl Into<String>,
        os: impl Into<String>,
        compressor_install: CommandSpec,
    ) -> Self {
        Self {
            name: name.into(),
            os: os.into(),
            compressor_install,
        }
    }

    /// macOS build
    pub fn osx() -> Self {
        Self::new(
            "macOS",
            "osx",
            CommandSpec::new("brew").args(["install", "upx"]),
        )
    }

    /// Linux build
    pub fn linux() -> Self {
        Self::new(
            "Linux",
            "linux",
            CommandSpec::new("sudo").args(["apt-get", "install", "-y", "upx-ucl"]),
        )
    }

    /// The default variant set
    pub fn defaults() -> Vec<Self> {
        vec![Self::osx(), Self::linux()]
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.os)
    }
}
