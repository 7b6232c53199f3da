//! Filesystem layout derived from the configured directories.

use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::StorageError;
use crate::sanitize;

const TITLE_SLUG_LEN: usize = 48;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub app_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl AppPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_dir: config.app_dir.clone(),
            cache_dir: config.cache_dir.clone(),
            config_dir: config.config_dir.clone(),
        }
    }

    pub fn database(&self) -> PathBuf {
        self.app_dir.join("db.sqlite")
    }

    pub fn tokens(&self) -> PathBuf {
        self.config_dir.join("tokens.json")
    }

    /// Staging directory the renderer reads its assets from.
    pub fn render_public_dir(&self) -> PathBuf {
        self.app_dir.join("remotion").join("public")
    }

    pub fn render_output_dir(&self) -> PathBuf {
        self.app_dir.join("remotion").join("output")
    }

    pub fn staged_video(&self) -> PathBuf {
        self.render_public_dir().join("video.mp4")
    }

    pub fn staged_audio(&self) -> PathBuf {
        self.render_public_dir().join("audio.mp3")
    }

    pub fn staged_subtitles(&self) -> PathBuf {
        self.render_public_dir().join("subtitles.json")
    }

    /// Output file for a rendered video: `<slug of title>-<hash of script>.mp4`.
    /// The same title and script always map to the same path.
    pub fn output_path(&self, title: &str, script: &str) -> PathBuf {
        let name = format!(
            "{}-{}.mp4",
            sanitize::slugify(title, TITLE_SLUG_LEN),
            sanitize::short_hash(script)
        );
        self.render_output_dir().join(name)
    }

    /// Creates every directory the application writes to.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in [
            self.app_dir.clone(),
            self.cache_dir.clone(),
            self.config_dir.clone(),
            self.render_public_dir(),
            self.render_output_dir(),
        ] {
            create_dir(&dir)?;
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<(), StorageError> {
    std::fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
        path: dir.to_path_buf(),
        source: e,
    })
}
