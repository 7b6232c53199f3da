//! Publishing rendered videos to the hosting platform.

pub mod youtube;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ExternalError;

pub use youtube::YouTubePublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Private,
    Unlisted,
    #[default]
    Public,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Public => "public",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub video_path: PathBuf,
    pub title: String,
    pub description: String,
    pub privacy_status: PrivacyStatus,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Uploads the video and returns the platform's id for it.
    async fn publish(
        &self,
        access_token: &SecretString,
        request: &PublishRequest,
    ) -> Result<String, ExternalError>;
}
