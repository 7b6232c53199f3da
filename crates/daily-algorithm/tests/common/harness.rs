//! Isolated environment for pipeline and upload-sweep tests.
//!
//! Every harness gets its own temp directory, an in-memory job store and a
//! fresh set of fakes.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use daily_algorithm::auth::{CredentialStore, TokenProvider};
use daily_algorithm::db::job_repo;
use daily_algorithm::job::JobRecord;
use daily_algorithm::publish::PrivacyStatus;
use daily_algorithm::{AppPaths, Collaborators, Database, Pipeline, PipelineConfig, UploadSweep};

use super::fakes::*;

pub const SOURCE_A: &str = "https://www.youtube.com/shorts/aaaaaaaaaaa";
pub const SOURCE_B: &str = "https://www.youtube.com/shorts/bbbbbbbbbbb";
pub const SCRIPT: &str = "Researchers taught a crow to use a vending machine. It now buys snacks for the entire flock and nobody knows who gave it the coins.";
pub const MAX_DISCOVERY_ATTEMPTS: u32 = 3;

pub struct TestHarness {
    temp_dir: TempDir,
    pub paths: AppPaths,
    pub db: Database,
    pub finder: Arc<FakeSourceFinder>,
    pub downloader: Arc<FakeDownloader>,
    pub script_generator: Arc<FakeScriptGenerator>,
    pub narrator: Arc<FakeNarrator>,
    pub bundler: Arc<FakeBundler>,
    pub renderer: Arc<FakeRenderer>,
    pub publisher: Arc<FakePublisher>,
    pub authenticator: Arc<FakeAuthenticator>,
    pub tokens: Arc<TokenProvider>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_sources(&[SOURCE_A, SOURCE_B])
    }

    pub fn with_sources(urls: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let paths = AppPaths {
            app_dir: base.join("app"),
            cache_dir: base.join("cache"),
            config_dir: base.join("config"),
        };
        paths.ensure_directories().unwrap();

        let authenticator = Arc::new(FakeAuthenticator::new());
        let tokens = Arc::new(TokenProvider::new(
            CredentialStore::new(paths.tokens()),
            authenticator.clone(),
        ));

        Self {
            db: Database::open_in_memory().unwrap(),
            finder: Arc::new(FakeSourceFinder::new(urls)),
            downloader: Arc::new(FakeDownloader::new(&base.join("downloads"))),
            script_generator: Arc::new(FakeScriptGenerator::new(SCRIPT)),
            narrator: Arc::new(FakeNarrator::new()),
            bundler: Arc::new(FakeBundler::new(&base.join("bundles"))),
            renderer: Arc::new(FakeRenderer::new()),
            publisher: Arc::new(FakePublisher::new()),
            authenticator,
            tokens,
            paths,
            temp_dir,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            paths: self.paths.clone(),
            render_entry_point: self.paths.app_dir.join("remotion/src/index.ts"),
            concurrency: 2,
            privacy_status: PrivacyStatus::Unlisted,
            duplicate_window: chrono::Duration::days(90),
            max_discovery_attempts: MAX_DISCOVERY_ATTEMPTS,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            source_finder: self.finder.clone(),
            downloader: self.downloader.clone(),
            script_generator: self.script_generator.clone(),
            narrator: self.narrator.clone(),
            bundler: self.bundler.clone(),
            renderer: self.renderer.clone(),
            publisher: self.publisher.clone(),
        }
    }

    /// Pipeline with inline publishing enabled.
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_without_publishing()
            .with_publishing(self.tokens.clone())
    }

    pub fn pipeline_without_publishing(&self) -> Pipeline {
        Pipeline::new(
            Arc::new(self.pipeline_config()),
            self.db.clone(),
            self.collaborators(),
        )
    }

    pub fn sweep(&self) -> UploadSweep {
        UploadSweep::new(
            self.db.clone(),
            self.tokens.clone(),
            self.publisher.clone(),
            PrivacyStatus::Unlisted,
        )
    }

    pub fn job(&self, id: i64) -> JobRecord {
        job_repo::find_by_id(&self.db, id).unwrap().unwrap()
    }

    pub fn jobs(&self) -> Vec<JobRecord> {
        job_repo::list_all(&self.db).unwrap()
    }

    /// Inserts a job that already used `url`.
    pub fn seed_job_with_source(&self, url: &str) -> JobRecord {
        let job = job_repo::create(&self.db).unwrap();
        job_repo::set_source_url(&self.db, job.id, url).unwrap();
        self.job(job.id)
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }
}
