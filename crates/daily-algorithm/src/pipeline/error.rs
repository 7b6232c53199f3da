use std::path::PathBuf;

use thiserror::Error;

use crate::error::{ExternalError, StorageError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source discovery failed: {0}")]
    Discovery(ExternalError),

    #[error("Download failed: {0}")]
    Download(ExternalError),

    #[error("Script generation failed: {0}")]
    Script(ExternalError),

    #[error("Narration failed: {0}")]
    Narration(ExternalError),

    #[error("Render failed: {0}")]
    Render(ExternalError),

    #[error("Publishing failed: {0}")]
    Publish(ExternalError),

    #[error("Publishing was requested but no credentials are configured")]
    PublishingDisabled,

    #[error("No unused source found after {attempts} attempts")]
    DuplicateLimit { attempts: u32 },

    #[error("Rendered video is missing: {0}")]
    MissingArtifact(PathBuf),

    #[error("Job {0} has no rendered video recorded")]
    MissingMetadata(i64),

    /// A stage ran before the stage producing its input.
    #[error("No {0} available from an earlier stage")]
    MissingInput(&'static str),

    /// Shutdown was requested; the job stopped between stages.
    #[error("Cancelled by shutdown request")]
    Cancelled,

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Job store failed: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] crate::auth::AuthError),
}
