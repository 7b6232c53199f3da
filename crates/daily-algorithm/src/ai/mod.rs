//! AI summarization: turning the source video into a narration script.

pub mod gemini;
pub mod prompts;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExternalError;

pub use gemini::GeminiClient;

/// A file uploaded to the AI service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    /// Service-side resource name, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Uploads media and waits until the service can use it.
    async fn upload_media(&self, path: &Path) -> Result<MediaHandle, ExternalError>;

    async fn generate_script(&self, media: &MediaHandle) -> Result<String, ExternalError>;

    /// Deletes every file this generator uploaded. Returns how many were removed.
    async fn release_all(&self) -> Result<usize, ExternalError>;
}
