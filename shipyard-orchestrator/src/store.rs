//! Variant report store
//!
//! Every run writes one JSON report per variant under
//! `<artifact dir>/reports/<os>.json`. When variants are built on separate
//! hosts, the artifact directories are gathered onto one machine and the
//! aggregation step reads the reports back to decide whether to publish.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shipyard_core::domain::artifact::Artifact;
use shipyard_core::domain::outcome::VariantReport;
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::variant::Variant;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Directory under the artifact directory holding the reports
pub const REPORT_DIR: &str = "reports";

/// A variant report together with the commit it was built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub commit: String,
    pub report: VariantReport,
}

/// Reads and writes variant reports on disk
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Store rooted at the configuration's artifact directory
    pub fn for_config(config: &PipelineConfig) -> Self {
        Self {
            dir: config.artifact_path().join(REPORT_DIR),
        }
    }

    pub fn path_for(&self, os: &str) -> PathBuf {
        self.dir.join(format!("{}.json", os))
    }

    /// Writes the report of one variant, replacing any earlier one
    pub async fn save(&self, commit: &str, report: &VariantReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path_for(&report.variant.os);
        let stored = StoredReport {
            commit: commit.to_string(),
            report: report.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored).context("Failed to serialize report")?;

        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Saved report for {} to {}", report.variant.os, path.display());
        Ok(path)
    }

    /// Reads the report of `variant` built from `commit`
    ///
    /// A missing, unreadable or stale report, or a successful report whose
    /// artifact is not on disk, comes back as an aborted report, so the
    /// variant counts as failed.
    pub async fn load(
        &self,
        config: &PipelineConfig,
        commit: &str,
        variant: &Variant,
    ) -> VariantReport {
        match self.read(config, commit, variant).await {
            Ok(report) => report,
            Err(e) => {
                warn!("[{}] {:#}", variant.os, e);
                VariantReport::aborted(variant.clone(), format!("{:#}", e))
            }
        }
    }

    /// Reads the reports of every configured variant, in configuration order
    pub async fn load_all(&self, config: &PipelineConfig, commit: &str) -> Vec<VariantReport> {
        let mut reports = Vec::with_capacity(config.variants.len());
        for variant in &config.variants {
            reports.push(self.load(config, commit, variant).await);
        }
        reports
    }

    async fn read(
        &self,
        config: &PipelineConfig,
        commit: &str,
        variant: &Variant,
    ) -> Result<VariantReport> {
        let path = self.path_for(&variant.os);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("No report for this variant at {}", path.display()))?;
        let stored: StoredReport = serde_json::from_slice(&bytes)
            .with_context(|| format!("Unreadable report {}", path.display()))?;

        if stored.commit != commit {
            anyhow::bail!(
                "Report {} was built from commit {}, not {}",
                path.display(),
                stored.commit,
                commit
            );
        }

        let mut report = stored.report;
        if report.succeeded() {
            // The reporting host may have had a different layout; the
            // artifact must be present in this host's artifact directory.
            let local = Artifact::for_variant(config, variant);
            if !local.path.is_file() {
                anyhow::bail!(
                    "Artifact {} reported as built is missing",
                    local.path.display()
                );
            }
            report.artifact = Some(local);
        }

        Ok(report)
    }
}
