//! The external services a pipeline run drives, bundled for injection.

use std::sync::Arc;
use std::time::Duration;

use crate::ai::{GeminiClient, ScriptGenerator};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::TdaError;
use crate::media::{CachedDownloader, Downloader, SourceFinder, YtDlpDownloader, YtDlpSourceFinder};
use crate::narration::{EdgeTtsSynthesizer, NarrationSynthesizer};
use crate::publish::{Publisher, YouTubePublisher};
use crate::render::{Bundler, CachedBundler, RemotionCli, Renderer};
use crate::secrets::{require_secret, GEMINI_API_KEY};

const VIDEO_CACHE_PREFIX: &str = "video";
const BUNDLE_CACHE_PREFIX: &str = "bundle";

#[derive(Clone)]
pub struct Collaborators {
    pub source_finder: Arc<dyn SourceFinder>,
    pub downloader: Arc<dyn Downloader>,
    pub script_generator: Arc<dyn ScriptGenerator>,
    pub narrator: Arc<dyn NarrationSynthesizer>,
    pub bundler: Arc<dyn Bundler>,
    pub renderer: Arc<dyn Renderer>,
    pub publisher: Arc<dyn Publisher>,
}

/// A lifetime too long to represent never expires.
fn hours(value: Option<u64>) -> Option<Duration> {
    value
        .and_then(|h| h.checked_mul(60 * 60))
        .map(Duration::from_secs)
}

impl Collaborators {
    /// Wires the command-line tools and HTTP clients used in production.
    /// Fails if `GEMINI_API_KEY` is not available.
    pub fn production(config: &Config) -> Result<Self, TdaError> {
        let api_key = require_secret(GEMINI_API_KEY)?;
        let script_generator = GeminiClient::new(api_key, config.ai_model.clone())?;

        let video_cache = TtlCache::new(
            &config.cache_dir,
            VIDEO_CACHE_PREFIX,
            hours(config.video_cache_ttl_hours),
        );
        let downloader = CachedDownloader::new(
            Arc::new(YtDlpDownloader::new(config.cache_dir.join("downloads"))),
            video_cache,
        );

        let remotion = Arc::new(RemotionCli::new(
            config.composition_id.clone(),
            config.cache_dir.join("remotion"),
        ));
        let bundle_cache = TtlCache::new(
            &config.cache_dir,
            BUNDLE_CACHE_PREFIX,
            hours(config.bundle_cache_ttl_hours),
        );
        let bundler = CachedBundler::new(remotion.clone(), bundle_cache);

        Ok(Self {
            source_finder: Arc::new(YtDlpSourceFinder::new(config.discovery_feed.clone())),
            downloader: Arc::new(downloader),
            script_generator: Arc::new(script_generator),
            narrator: Arc::new(EdgeTtsSynthesizer::new(
                config.narration_voice.clone(),
                std::env::temp_dir(),
            )),
            bundler: Arc::new(bundler),
            renderer: remotion,
            publisher: Arc::new(YouTubePublisher::new()?),
        })
    }
}
