//! Text-to-speech narration with word-timed subtitles.

pub mod edge_tts;
pub mod vtt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExternalError;

pub use edge_tts::EdgeTtsSynthesizer;

/// One subtitle cue; times are in milliseconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub text: String,
    pub start: u64,
    pub duration: u64,
    pub end: u64,
}

impl SubtitleCue {
    pub fn new(text: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            text: text.into(),
            start,
            duration: end.saturating_sub(start),
            end,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Narration {
    pub audio: Vec<u8>,
    pub subtitles: Vec<SubtitleCue>,
}

#[async_trait]
pub trait NarrationSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Narration, ExternalError>;
}
