use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::publish::PrivacyStatus;

pub const APP_NAME: &str = "the-daily-algorithm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_app_dir")]
    pub app_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Where `config.json` and the stored credentials live.
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Render concurrency.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
    #[serde(default)]
    pub privacy_status: PrivacyStatus,
    #[serde(default = "default_duplicate_window_days")]
    pub duplicate_window_days: u32,
    #[serde(default = "default_max_discovery_attempts")]
    pub max_discovery_attempts: u32,
    #[serde(default = "default_video_cache_ttl_hours")]
    pub video_cache_ttl_hours: Option<u64>,
    #[serde(default)]
    pub bundle_cache_ttl_hours: Option<u64>,
    #[serde(default = "default_discovery_feed")]
    pub discovery_feed: String,
    /// Remotion entry point; relative paths resolve against `app_dir`.
    #[serde(default = "default_render_entry_point")]
    pub render_entry_point: PathBuf,
    #[serde(default = "default_composition_id")]
    pub composition_id: String,
    #[serde(default)]
    pub narration_voice: Option<String>,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default = "default_generate_schedule")]
    pub generate_schedule: String,
    #[serde(default = "default_upload_schedule")]
    pub upload_schedule: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_app_dir() -> PathBuf {
    home_dir().join(".local").join("share").join(APP_NAME)
}

fn default_cache_dir() -> PathBuf {
    home_dir().join(".cache").join(APP_NAME)
}

pub fn default_config_dir() -> PathBuf {
    home_dir().join(".config").join(APP_NAME)
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

fn default_callback_port() -> u16 {
    4160
}

fn default_duplicate_window_days() -> u32 {
    90
}

fn default_max_discovery_attempts() -> u32 {
    10
}

fn default_video_cache_ttl_hours() -> Option<u64> {
    Some(24)
}

fn default_discovery_feed() -> String {
    "https://www.youtube.com/@YouTube/shorts".to_string()
}

fn default_render_entry_point() -> PathBuf {
    PathBuf::from("remotion").join("src").join("index.ts")
}

fn default_composition_id() -> String {
    "DailyAlgorithm".to_string()
}

fn default_ai_model() -> String {
    "gemini-1.5-flash-8b".to_string()
}

fn default_generate_schedule() -> String {
    "0 0 */6 * * *".to_string()
}

fn default_upload_schedule() -> String {
    "0 */4 * * *".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_dir: default_app_dir(),
            cache_dir: default_cache_dir(),
            config_dir: default_config_dir(),
            concurrency: default_concurrency(),
            callback_port: default_callback_port(),
            privacy_status: PrivacyStatus::default(),
            duplicate_window_days: default_duplicate_window_days(),
            max_discovery_attempts: default_max_discovery_attempts(),
            video_cache_ttl_hours: default_video_cache_ttl_hours(),
            bundle_cache_ttl_hours: None,
            discovery_feed: default_discovery_feed(),
            render_entry_point: default_render_entry_point(),
            composition_id: default_composition_id(),
            narration_voice: None,
            ai_model: default_ai_model(),
            generate_schedule: default_generate_schedule(),
            upload_schedule: default_upload_schedule(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn render_entry_point(&self) -> PathBuf {
        if self.render_entry_point.is_absolute() {
            self.render_entry_point.clone()
        } else {
            self.app_dir.join(&self.render_entry_point)
        }
    }
}
