//! File-backed TTL cache.
//!
//! Entries live in `<cache_dir>/<prefix>-cache.json` as
//! `{ "<key>": { "timestamp": <unix ms>, "data": <value> } }`. The file is
//! read lazily on first access and rewritten atomically after each change.
//! Disk problems never surface to callers: a broken file means a cold cache.

use std::collections::HashMap;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::keys::CacheKey;

/// A cached filesystem location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPath {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry<V> {
    timestamp: i64,
    data: V,
}

struct CacheState<V> {
    loaded: bool,
    entries: HashMap<String, CacheEntry<V>>,
}

pub struct TtlCache<K, V> {
    file: PathBuf,
    ttl: Option<Duration>,
    state: Mutex<CacheState<V>>,
    _key: PhantomData<fn(&K)>,
}

impl<K, V> TtlCache<K, V>
where
    K: CacheKey,
    V: Serialize + DeserializeOwned + Clone,
{
    /// `ttl = None` means entries never expire.
    pub fn new(cache_dir: impl AsRef<Path>, prefix: &str, ttl: Option<Duration>) -> Self {
        Self {
            file: cache_dir.as_ref().join(format!("{}-cache.json", prefix)),
            ttl,
            state: Mutex::new(CacheState {
                loaded: false,
                entries: HashMap::new(),
            }),
            _key: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Returns the value for `key` unless it is absent or expired.
    /// Expired entries are evicted as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let key = key.cache_key();
        let mut state = self.lock();
        self.ensure_loaded(&mut state);

        let entry = state.entries.get(&key)?;
        if !self.is_expired(entry.timestamp) {
            return Some(entry.data.clone());
        }

        log::debug!("Cache entry expired in {}", self.file.display());
        state.entries.remove(&key);
        self.persist(&state.entries);
        None
    }

    /// Inserts or replaces `key` with the current time as its timestamp.
    pub fn set(&self, key: &K, value: V) {
        let mut state = self.lock();
        self.ensure_loaded(&mut state);
        state.entries.insert(
            key.cache_key(),
            CacheEntry {
                timestamp: Utc::now().timestamp_millis(),
                data: value,
            },
        );
        self.persist(&state.entries);
    }

    /// Drops every entry, in memory and on disk.
    pub fn cleanup(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.loaded = true;
        match std::fs::remove_file(&self.file) {
            Ok(()) => log::info!("Removed cache file {}", self.file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove cache file {}: {}", self.file.display(), e),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        match self.ttl {
            Some(ttl) => {
                let age = Utc::now().timestamp_millis().saturating_sub(timestamp);
                age > ttl.as_millis() as i64
            }
            None => false,
        }
    }

    fn ensure_loaded(&self, state: &mut CacheState<V>) {
        if state.loaded {
            return;
        }
        state.entries = self.load();
        state.loaded = true;
    }

    fn load(&self) -> HashMap<String, CacheEntry<V>> {
        let content = match std::fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                log::warn!("Failed to read cache file {}: {}", self.file.display(), e);
                return HashMap::new();
            }
        };

        let raw: HashMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Ignoring malformed cache file {}: {}", self.file.display(), e);
                return HashMap::new();
            }
        };

        let total = raw.len();
        let entries: HashMap<String, CacheEntry<V>> = raw
            .into_iter()
            .filter_map(|(key, value)| {
                serde_json::from_value::<CacheEntry<V>>(value)
                    .ok()
                    .map(|entry| (key, entry))
            })
            .collect();

        if entries.len() < total {
            log::debug!(
                "Dropped {} invalid entries from {}",
                total - entries.len(),
                self.file.display()
            );
        }
        entries
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry<V>>) {
        if let Err(e) = self.write_atomically(entries) {
            log::warn!("Failed to save cache file {}: {}", self.file.display(), e);
        }
    }

    fn write_atomically(&self, entries: &HashMap<String, CacheEntry<V>>) -> std::io::Result<()> {
        let dir = self.file.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_vec_pretty(entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.file).map_err(|e| e.error)?;
        Ok(())
    }
}
