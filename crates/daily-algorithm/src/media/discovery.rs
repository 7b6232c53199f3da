//! Finding a candidate short to remix.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::process::run_command;
use crate::error::ExternalError;

const YT_DLP: &str = "yt-dlp";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(60);
const PLAYLIST_DEPTH: &str = "50";

#[async_trait]
pub trait SourceFinder: Send + Sync {
    /// Returns one candidate source. Repeated calls may return different ones.
    async fn find_source(&self) -> Result<Url, ExternalError>;
}

/// Lists a shorts feed with `yt-dlp --flat-playlist` and picks one entry.
pub struct YtDlpSourceFinder {
    feed_url: String,
    timeout: Duration,
}

impl YtDlpSourceFinder {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            timeout: DISCOVERY_TIMEOUT,
        }
    }
}

/// Parses the listing into candidate URLs, skipping blank or non-http lines.
pub fn parse_candidates(listing: &str) -> Vec<Url> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .filter_map(|line| Url::parse(line).ok())
        .collect()
}

/// Picks the candidate at `seed` modulo the candidate count.
pub fn pick_candidate(candidates: &[Url], seed: u64) -> Option<Url> {
    if candidates.is_empty() {
        return None;
    }
    let idx = (seed % candidates.len() as u64) as usize;
    Some(candidates[idx].clone())
}

#[async_trait]
impl SourceFinder for YtDlpSourceFinder {
    async fn find_source(&self) -> Result<Url, ExternalError> {
        let output = run_command(
            YT_DLP,
            [
                "--flat-playlist",
                "--print",
                "url",
                "--playlist-end",
                PLAYLIST_DEPTH,
                self.feed_url.as_str(),
            ],
            self.timeout,
        )
        .await?;

        let candidates = parse_candidates(&output.stdout);
        let seed = uuid::Uuid::new_v4().as_u128() as u64;
        let picked = pick_candidate(&candidates, seed).ok_or_else(|| ExternalError::NoCandidates {
            feed: self.feed_url.clone(),
        })?;

        log::info!(
            "Discovered {} candidates, picked {}",
            candidates.len(),
            picked
        );
        Ok(picked)
    }
}
