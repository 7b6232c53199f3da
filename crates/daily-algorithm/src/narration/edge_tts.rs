//! Narration through the `edge-tts` command-line tool.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::vtt::parse_cues;
use super::{Narration, NarrationSynthesizer};
use crate::error::ExternalError;
use crate::media::process::run_command;

const EDGE_TTS: &str = "edge-tts";
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(2 * 60);

pub struct EdgeTtsSynthesizer {
    voice: Option<String>,
    work_root: PathBuf,
    timeout: Duration,
}

impl EdgeTtsSynthesizer {
    pub fn new(voice: Option<String>, work_root: impl Into<PathBuf>) -> Self {
        Self {
            voice,
            work_root: work_root.into(),
            timeout: SYNTHESIS_TIMEOUT,
        }
    }

    async fn synthesize_in(&self, dir: &std::path::Path, text: &str) -> Result<Narration, ExternalError> {
        let text_file = dir.join("script.txt");
        let audio_file = dir.join("audio.mp3");
        let subtitle_file = dir.join("subtitles.vtt");

        write(&text_file, text.as_bytes()).await?;

        let mut args = vec![
            "--file".to_string(),
            text_file.to_string_lossy().into_owned(),
            "--write-media".to_string(),
            audio_file.to_string_lossy().into_owned(),
            "--write-subtitles".to_string(),
            subtitle_file.to_string_lossy().into_owned(),
        ];
        if let Some(voice) = &self.voice {
            args.extend(["--voice".to_string(), voice.clone()]);
        }

        run_command(EDGE_TTS, args, self.timeout).await?;

        let audio = read(&audio_file).await?;
        if audio.is_empty() {
            return Err(ExternalError::UnexpectedOutput {
                program: EDGE_TTS.to_string(),
                message: "produced empty audio".to_string(),
            });
        }

        let subtitles = read(&subtitle_file).await?;
        let subtitles = parse_cues(&String::from_utf8_lossy(&subtitles));
        if subtitles.is_empty() {
            log::warn!("Narration has no subtitle cues");
        }

        log::info!(
            "Synthesized {} bytes of audio with {} subtitle cues",
            audio.len(),
            subtitles.len()
        );
        Ok(Narration { audio, subtitles })
    }
}

async fn write(path: &std::path::Path, bytes: &[u8]) -> Result<(), ExternalError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ExternalError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

async fn read(path: &std::path::Path) -> Result<Vec<u8>, ExternalError> {
    tokio::fs::read(path).await.map_err(|e| ExternalError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[async_trait]
impl NarrationSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Narration, ExternalError> {
        let dir = self
            .work_root
            .join(format!("narration-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ExternalError::Io {
                path: dir.clone(),
                source: e,
            })?;

        let result = self.synthesize_in(&dir, text).await;

        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            log::debug!("Failed to remove {}: {}", dir.display(), e);
        }
        result
    }
}
