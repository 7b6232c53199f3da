//! In-memory stand-ins for every external service the pipeline drives.
//!
//! Each fake records how it was called and can be told to fail.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use daily_algorithm::ai::{MediaHandle, ScriptGenerator};
use daily_algorithm::auth::{AuthError, Authenticator, Tokens};
use daily_algorithm::cache::MediaVariant;
use daily_algorithm::media::{Downloader, SourceFinder};
use daily_algorithm::narration::{Narration, NarrationSynthesizer, SubtitleCue};
use daily_algorithm::publish::{PublishRequest, Publisher};
use daily_algorithm::render::{Bundler, RenderProps, Renderer};
use daily_algorithm::ExternalError;

pub const RENDERED_BYTES: &[u8] = b"rendered video";
pub const AUDIO_BYTES: &[u8] = b"narration audio";

fn failure(program: &str) -> ExternalError {
    ExternalError::CommandFailed {
        program: program.to_string(),
        message: "simulated failure".to_string(),
    }
}

/// Hands out its URLs in order, wrapping around.
pub struct FakeSourceFinder {
    urls: Vec<Url>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeSourceFinder {
    pub fn new(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| Url::parse(u).unwrap()).collect(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFinder for FakeSourceFinder {
    async fn find_source(&self) -> Result<Url, ExternalError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExternalError::NoCandidates {
                feed: "fake feed".to_string(),
            });
        }
        Ok(self.urls[n % self.urls.len()].clone())
    }
}

/// Writes a small file per download under its root.
pub struct FakeDownloader {
    root: PathBuf,
    pub downloaded: Mutex<Vec<(Url, MediaVariant)>>,
    pub fail: AtomicBool,
}

impl FakeDownloader {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            downloaded: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        self.downloaded.lock().unwrap().len()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &Url, variant: MediaVariant) -> Result<PathBuf, ExternalError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(failure("yt-dlp"));
        }
        let mut downloaded = self.downloaded.lock().unwrap();
        std::fs::create_dir_all(&self.root).unwrap();
        let path = self.root.join(format!("source-{}.mp4", downloaded.len()));
        std::fs::write(&path, format!("video from {}", url)).unwrap();
        downloaded.push((url.clone(), variant));
        Ok(path)
    }
}

pub struct FakeScriptGenerator {
    pub script: Mutex<String>,
    pub uploads: Mutex<Vec<PathBuf>>,
    pub generate_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeScriptGenerator {
    pub fn new(script: &str) -> Self {
        Self {
            script: Mutex::new(script.to_string()),
            uploads: Mutex::new(Vec::new()),
            generate_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn release_count(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptGenerator for FakeScriptGenerator {
    async fn upload_media(&self, path: &Path) -> Result<MediaHandle, ExternalError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(path.to_path_buf());
        Ok(MediaHandle {
            name: format!("files/{}", uploads.len()),
            uri: format!("https://ai.example/files/{}", uploads.len()),
            mime_type: "video/mp4".to_string(),
        })
    }

    async fn generate_script(&self, _media: &MediaHandle) -> Result<String, ExternalError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExternalError::InvalidResponse {
                service: "fake AI".to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(self.script.lock().unwrap().clone())
    }

    async fn release_all(&self) -> Result<usize, ExternalError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let mut uploads = self.uploads.lock().unwrap();
        let released = uploads.len();
        uploads.clear();
        Ok(released)
    }
}

/// Optionally takes `delay` to synthesize, standing in for a slow stage.
pub struct FakeNarrator {
    pub calls: AtomicUsize,
    pub delay: Mutex<Duration>,
    pub fail: AtomicBool,
}

impl FakeNarrator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
            fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrationSynthesizer for FakeNarrator {
    async fn synthesize(&self, _text: &str) -> Result<Narration, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(failure("edge-tts"));
        }
        Ok(Narration {
            audio: AUDIO_BYTES.to_vec(),
            subtitles: vec![
                SubtitleCue::new("Hello", 0, 400),
                SubtitleCue::new("world", 400, 900),
            ],
        })
    }
}

/// Creates one bundle directory and hands it out on every call.
pub struct FakeBundler {
    root: PathBuf,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeBundler {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.root.join("bundle")
    }
}

#[async_trait]
impl Bundler for FakeBundler {
    async fn bundle(&self, _entry_point: &Path, _public_dir: &Path) -> Result<PathBuf, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(failure("npx"));
        }
        let dir = self.bundle_dir();
        std::fs::create_dir_all(&dir).unwrap();
        Ok(dir)
    }
}

/// Records the props of each render and the audio it found in the bundle.
pub struct FakeRenderer {
    pub renders: Mutex<Vec<RenderProps>>,
    pub bundled_audio: Mutex<Vec<Vec<u8>>>,
    pub fail: AtomicBool,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self {
            renders: Mutex::new(Vec::new()),
            bundled_audio: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(
        &self,
        bundle: &Path,
        props: &RenderProps,
        _concurrency: usize,
    ) -> Result<Vec<u8>, ExternalError> {
        self.renders.lock().unwrap().push(props.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(failure("npx"));
        }
        let audio = std::fs::read(bundle.join("public").join(&props.audio_src)).unwrap_or_default();
        self.bundled_audio.lock().unwrap().push(audio);
        Ok(RENDERED_BYTES.to_vec())
    }
}

pub struct FakePublisher {
    pub requests: Mutex<Vec<PublishRequest>>,
    pub tokens_seen: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            tokens_seen: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(
        &self,
        access_token: &SecretString,
        request: &PublishRequest,
    ) -> Result<String, ExternalError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        self.tokens_seen
            .lock()
            .unwrap()
            .push(access_token.expose_secret().to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExternalError::InvalidResponse {
                service: "fake video host".to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        Ok(format!("remote-{}", requests.len()))
    }
}

/// Grants hour-long tokens without any user interaction.
pub struct FakeAuthenticator {
    pub authenticate_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

impl FakeAuthenticator {
    pub fn new() -> Self {
        Self {
            authenticate_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self) -> Result<Tokens, AuthError> {
        let n = self.authenticate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Tokens::from_grant(
            format!("access-{}", n),
            Some("refresh".to_string()),
            3600,
            Utc::now(),
        )
    }

    async fn refresh(&self, _refresh_token: &SecretString) -> Result<Tokens, AuthError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Tokens::from_grant(format!("refreshed-{}", n), None, 3600, Utc::now())
    }
}
