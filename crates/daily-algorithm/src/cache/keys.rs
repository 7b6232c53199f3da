//! Typed cache keys.
//!
//! Each cache has its own key type so that callers cannot build the string
//! form by hand and collide with another cache's entries.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Anything that renders to a stable cache-file key.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaVariant {
    Video,
    Music,
}

impl MediaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaVariant::Video => "video",
            MediaVariant::Music => "music",
        }
    }
}

impl fmt::Display for MediaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key for downloaded source media: `<url>-<video|music>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCacheKey {
    pub url: String,
    pub variant: MediaVariant,
}

impl VideoCacheKey {
    pub fn new(url: impl Into<String>, variant: MediaVariant) -> Self {
        Self {
            url: url.into(),
            variant,
        }
    }
}

impl CacheKey for VideoCacheKey {
    fn cache_key(&self) -> String {
        format!("{}-{}", self.url, self.variant)
    }
}

/// Key for a renderer bundle, derived from what the bundle was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleCacheKey {
    pub entry_point: PathBuf,
    pub public_dir: PathBuf,
}

impl CacheKey for BundleCacheKey {
    fn cache_key(&self) -> String {
        format!(
            "{}|{}",
            self.entry_point.display(),
            self.public_dir.display()
        )
    }
}
