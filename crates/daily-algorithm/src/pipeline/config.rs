use std::path::PathBuf;

use crate::config::{AppPaths, Config};
use crate::publish::PrivacyStatus;

pub struct PipelineConfig {
    pub paths: AppPaths,
    pub render_entry_point: PathBuf,
    pub concurrency: usize,
    pub privacy_status: PrivacyStatus,
    /// A source used by a non-failed job inside this window is skipped.
    pub duplicate_window: chrono::Duration,
    pub max_discovery_attempts: u32,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            paths: AppPaths::from_config(config),
            render_entry_point: config.render_entry_point(),
            concurrency: config.concurrency.max(1),
            privacy_status: config.privacy_status,
            duplicate_window: chrono::Duration::days(i64::from(config.duplicate_window_days)),
            max_discovery_attempts: config.max_discovery_attempts.max(1),
        }
    }

    /// Overrides the render concurrency (`--cores`).
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        if let Some(n) = concurrency {
            self.concurrency = n.max(1);
        }
        self
    }
}
