//! Video composition: bundling the render project and rendering frames.

pub mod remotion;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{BundleCacheKey, CachedPath, TtlCache};
use crate::error::{ExternalError, StorageError};
use crate::narration::SubtitleCue;

pub use remotion::RemotionCli;

/// Input properties handed to the composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProps {
    /// Asset names relative to the public directory.
    pub audio_src: String,
    pub video_src: String,
    pub subtitles: Vec<SubtitleCue>,
}

#[async_trait]
pub trait Bundler: Send + Sync {
    /// Builds the render project and returns the bundle location.
    async fn bundle(&self, entry_point: &Path, public_dir: &Path) -> Result<PathBuf, ExternalError>;
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders the composition and returns the encoded video.
    async fn render(
        &self,
        bundle: &Path,
        props: &RenderProps,
        concurrency: usize,
    ) -> Result<Vec<u8>, ExternalError>;
}

/// Reuses a previous bundle while its directory still exists.
pub struct CachedBundler {
    inner: Arc<dyn Bundler>,
    cache: TtlCache<BundleCacheKey, CachedPath>,
}

impl CachedBundler {
    pub fn new(inner: Arc<dyn Bundler>, cache: TtlCache<BundleCacheKey, CachedPath>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Bundler for CachedBundler {
    async fn bundle(&self, entry_point: &Path, public_dir: &Path) -> Result<PathBuf, ExternalError> {
        let key = BundleCacheKey {
            entry_point: entry_point.to_path_buf(),
            public_dir: public_dir.to_path_buf(),
        };

        if let Some(cached) = self.cache.get(&key) {
            if cached.path.is_dir() {
                log::info!("Using cached render bundle");
                return Ok(cached.path);
            }
        }

        let path = self.inner.bundle(entry_point, public_dir).await?;
        self.cache.set(&key, CachedPath { path: path.clone() });
        Ok(path)
    }
}

/// Copies the staged assets into the bundle's own `public` directory.
///
/// A bundle snapshots its public directory when it is built, so a reused
/// bundle would otherwise render the assets of an earlier job.
pub fn sync_public_assets(public_dir: &Path, bundle: &Path) -> Result<usize, StorageError> {
    let target = bundle.join("public");
    std::fs::create_dir_all(&target).map_err(|e| StorageError::CreateDirectory {
        path: target.clone(),
        source: e,
    })?;

    let entries = std::fs::read_dir(public_dir).map_err(|e| StorageError::ReadFile {
        path: public_dir.to_path_buf(),
        source: e,
    })?;

    let mut copied = 0;
    for entry in entries.flatten() {
        let from = entry.path();
        if !from.is_file() {
            continue;
        }
        let to = target.join(entry.file_name());
        std::fs::copy(&from, &to).map_err(|e| StorageError::CopyFile {
            from: from.clone(),
            to: to.clone(),
            source: e,
        })?;
        copied += 1;
    }
    Ok(copied)
}
