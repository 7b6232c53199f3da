//! Video job domain types.
//!
//! A job moves forward through a fixed sequence of pending stages and ends
//! in `Completed`, or drops to `Failed` from any non-terminal stage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    PendingVideo,
    PendingScript,
    PendingAudio,
    PendingRender,
    PendingUpload,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
#[error("Unknown job status: '{0}'")]
pub struct ParseStatusError(pub String);

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::PendingVideo,
        JobStatus::PendingScript,
        JobStatus::PendingAudio,
        JobStatus::PendingRender,
        JobStatus::PendingUpload,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::PendingVideo => "pending_video",
            JobStatus::PendingScript => "pending_script",
            JobStatus::PendingAudio => "pending_audio",
            JobStatus::PendingRender => "pending_render",
            JobStatus::PendingUpload => "pending_upload",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Position in the forward order. `Failed` sits outside it.
    fn position(&self) -> Option<u8> {
        match self {
            JobStatus::PendingVideo => Some(0),
            JobStatus::PendingScript => Some(1),
            JobStatus::PendingAudio => Some(2),
            JobStatus::PendingRender => Some(3),
            JobStatus::PendingUpload => Some(4),
            JobStatus::Completed => Some(5),
            JobStatus::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a job in this status may move to `next`.
    ///
    /// Terminal statuses never change. Any other status may fail, or move
    /// strictly forward.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Failed {
            return true;
        }
        match (self.position(), next.position()) {
            (Some(current), Some(target)) => target > current,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A persisted job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: i64,
    pub status: JobStatus,
    pub source_url: Option<String>,
    pub script: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub output_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written together once a job has a rendered artifact.
#[derive(Debug, Clone)]
pub struct JobFields {
    pub status: JobStatus,
    pub script: String,
    pub title: String,
    pub description: String,
    pub output_path: String,
}
