//! Media download through `yt-dlp`, with a TTL cache in front.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::process::run_command;
use crate::cache::{CachedPath, MediaVariant, TtlCache, VideoCacheKey};
use crate::error::ExternalError;
use crate::sanitize;

const YT_DLP: &str = "yt-dlp";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` and returns the local file path.
    async fn download(&self, url: &Url, variant: MediaVariant) -> Result<PathBuf, ExternalError>;
}

pub struct YtDlpDownloader {
    download_root: PathBuf,
    timeout: Duration,
}

impl YtDlpDownloader {
    /// Each download gets its own directory under `download_root`.
    pub fn new(download_root: impl Into<PathBuf>) -> Self {
        Self {
            download_root: download_root.into(),
            timeout: DOWNLOAD_TIMEOUT,
        }
    }

    fn arguments(url: &Url, variant: MediaVariant, dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--paths".to_string(),
            dir.to_string_lossy().into_owned(),
            "--output".to_string(),
            "%(id)s.%(ext)s".to_string(),
        ];
        match variant {
            MediaVariant::Video => {
                args.extend(["--format".to_string(), "mp4".to_string()]);
            }
            MediaVariant::Music => {
                args.extend([
                    "--extract-audio".to_string(),
                    "--audio-format".to_string(),
                    "mp3".to_string(),
                ]);
            }
        }
        args.push(url.as_str().to_string());
        args
    }
}

/// Extracts the final file path from `yt-dlp` output.
///
/// The last `Destination:` line wins, since post-processors (audio
/// extraction, merging) announce their output after the raw download.
/// "has already been downloaded" lines are honoured too.
pub fn parse_destination(output: &str) -> Option<PathBuf> {
    let mut destination = None;
    for line in output.lines() {
        if let Some(idx) = line.find("Destination: ") {
            let path = line[idx + "Destination: ".len()..].trim();
            if !path.is_empty() {
                destination = Some(PathBuf::from(path));
            }
        } else if let Some(rest) = line.strip_prefix("[download] ") {
            if let Some(path) = rest.strip_suffix(" has already been downloaded") {
                destination = Some(PathBuf::from(path.trim()));
            }
        }
    }
    destination
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, url: &Url, variant: MediaVariant) -> Result<PathBuf, ExternalError> {
        let dir = self
            .download_root
            .join(format!("video-download-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ExternalError::Io {
                path: dir.clone(),
                source: e,
            })?;

        log::info!("Downloading {} ({})", url, variant);
        let output = run_command(YT_DLP, Self::arguments(url, variant, &dir), self.timeout).await?;

        let path = parse_destination(&output.stdout).ok_or_else(|| ExternalError::UnexpectedOutput {
            program: YT_DLP.to_string(),
            message: "no destination file reported".to_string(),
        })?;
        let path = if path.is_absolute() { path } else { dir.join(path) };

        log::info!("Downloaded {}", sanitize::redact_path(&path));
        Ok(path)
    }
}

/// Serves downloads from the video cache when the cached file still exists.
pub struct CachedDownloader {
    inner: Arc<dyn Downloader>,
    cache: TtlCache<VideoCacheKey, CachedPath>,
}

impl CachedDownloader {
    pub fn new(inner: Arc<dyn Downloader>, cache: TtlCache<VideoCacheKey, CachedPath>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Downloader for CachedDownloader {
    async fn download(&self, url: &Url, variant: MediaVariant) -> Result<PathBuf, ExternalError> {
        let key = VideoCacheKey::new(url.as_str(), variant);

        if let Some(cached) = self.cache.get(&key) {
            if cached.path.exists() {
                log::info!("Using cached download {}", sanitize::redact_path(&cached.path));
                return Ok(cached.path);
            }
            log::debug!("Cached download is gone, downloading again");
        }

        let path = self.inner.download(url, variant).await?;
        self.cache.set(&key, CachedPath { path: path.clone() });
        Ok(path)
    }
}
