//! Test doubles shared by the orchestrator's unit tests

use async_trait::async_trait;
use shipyard_client::{ClientError, ReleaseHost};
use shipyard_core::domain::artifact::Artifact;
use shipyard_core::domain::outcome::{FailureKind, VariantReport};
use shipyard_core::domain::pipeline::PipelineConfig;
use shipyard_core::domain::step::VariantState;
use shipyard_core::domain::variant::Variant;
use shipyard_core::dto::release::{CreateRelease, Release, ReleaseAsset};
use shipyard_runner::ExecutionService;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Release host keeping everything in memory
#[derive(Default)]
pub struct MemoryHost {
    releases: Mutex<Vec<Release>>,
    next_id: Mutex<u64>,
    /// Uploaded bytes keyed by (release id, asset name)
    pub uploads: Mutex<HashMap<(u64, String), Vec<u8>>>,
    pub deleted: Mutex<Vec<u64>>,
    /// Status returned by `create_release` instead of succeeding
    pub reject_create: Option<u16>,
    /// Uploads left before every further upload fails with a 502
    upload_budget: Mutex<Option<usize>>,
}

impl MemoryHost {
    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_create: Some(status),
            ..Self::default()
        }
    }

    /// Lets `n` more uploads through, then fails the rest
    pub fn fail_after_uploads(&self, n: usize) {
        *self.upload_budget.lock().unwrap() = Some(n);
    }

    pub fn releases(&self) -> Vec<Release> {
        self.releases.lock().unwrap().clone()
    }

    pub fn releases_tagged(&self, tag: &str) -> Vec<Release> {
        self.releases()
            .into_iter()
            .filter(|r| r.tag_name == tag)
            .collect()
    }
}

#[async_trait]
impl ReleaseHost for MemoryHost {
    async fn find_release_by_tag(&self, tag: &str) -> shipyard_client::Result<Option<Release>> {
        Ok(self
            .releases
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned())
    }

    async fn delete_release(&self, release_id: u64) -> shipyard_client::Result<()> {
        let mut releases = self.releases.lock().unwrap();
        let before = releases.len();
        releases.retain(|r| r.id != release_id);
        if releases.len() == before {
            return Err(ClientError::api_error(404, "Not Found"));
        }
        self.deleted.lock().unwrap().push(release_id);
        Ok(())
    }

    async fn create_release(&self, req: CreateRelease) -> shipyard_client::Result<Release> {
        if let Some(status) = self.reject_create {
            return Err(ClientError::api_error(status, "Bad credentials"));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = *next_id;

        let release = Release {
            id,
            tag_name: req.tag_name,
            name: Some(req.name),
            draft: req.draft,
            html_url: format!("https://example.test/releases/{}", id),
            upload_url: format!("https://uploads.example.test/releases/{}/assets{{?name,label}}", id),
            assets: Vec::new(),
        };
        self.releases.lock().unwrap().push(release.clone());
        Ok(release)
    }

    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        contents: Vec<u8>,
    ) -> shipyard_client::Result<ReleaseAsset> {
        if let Some(left) = self.upload_budget.lock().unwrap().as_mut() {
            if *left == 0 {
                return Err(ClientError::api_error(502, "Bad Gateway"));
            }
            *left -= 1;
        }

        let asset = ReleaseAsset {
            id: release.id * 100 + self.uploads.lock().unwrap().len() as u64,
            name: name.to_string(),
            size: contents.len() as u64,
            browser_download_url: format!("{}/{}", release.html_url, name),
        };

        let mut releases = self.releases.lock().unwrap();
        let stored = releases
            .iter_mut()
            .find(|r| r.id == release.id)
            .ok_or_else(|| ClientError::api_error(404, "Not Found"))?;
        stored.assets.push(asset.clone());

        self.uploads
            .lock()
            .unwrap()
            .insert((release.id, name.to_string()), contents);
        Ok(asset)
    }
}

/// Execution service that skips the tools and writes a fake artifact,
/// failing the variants listed in `failures`
#[derive(Default)]
pub struct FakeExecution {
    pub failures: HashMap<String, FailureKind>,
    pub runs: AtomicUsize,
}

impl FakeExecution {
    pub fn failing(os: &str, kind: FailureKind) -> Self {
        Self {
            failures: HashMap::from([(os.to_string(), kind)]),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionService for FakeExecution {
    async fn execute_variant(&self, config: &PipelineConfig, variant: &Variant) -> VariantReport {
        self.runs.fetch_add(1, Ordering::SeqCst);

        let (state, artifact) = match self.failures.get(&variant.os) {
            Some(kind) => (VariantState::Failed(*kind), None),
            None => {
                let artifact = Artifact::for_variant(config, variant);
                tokio::fs::create_dir_all(config.artifact_path())
                    .await
                    .unwrap();
                tokio::fs::write(&artifact.path, format!("binary for {}", variant.os))
                    .await
                    .unwrap();
                (VariantState::Done, Some(artifact))
            }
        };

        VariantReport {
            run_id: Uuid::new_v4(),
            variant: variant.clone(),
            state,
            history: vec![VariantState::Pending, state],
            steps: Vec::new(),
            artifact,
            logs: Vec::new(),
        }
    }
}
