//! Publishing of rendered jobs that were left in `pending_upload`.

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};
use tracing::{info_span, Instrument};

use crate::auth::TokenProvider;
use crate::db::{job_repo, Database};
use crate::job::{JobRecord, JobStatus};
use crate::publish::{PrivacyStatus, PublishRequest, Publisher};
use crate::sanitize;

use super::error::PipelineError;
use super::runner::derive_title;

/// What a single sweep did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No job was waiting.
    Idle,
    Published { job_id: i64, remote_id: String },
    Failed { job_id: i64, error: String },
    /// The job store could not be queried.
    Unavailable(String),
}

pub struct UploadSweep {
    db: Database,
    tokens: Arc<TokenProvider>,
    publisher: Arc<dyn Publisher>,
    privacy_status: PrivacyStatus,
}

impl UploadSweep {
    pub fn new(
        db: Database,
        tokens: Arc<TokenProvider>,
        publisher: Arc<dyn Publisher>,
        privacy_status: PrivacyStatus,
    ) -> Self {
        Self {
            db,
            tokens,
            publisher,
            privacy_status,
        }
    }

    /// Publishes the oldest job waiting for upload, if any.
    ///
    /// Never returns an error: a failed upload marks that job `failed` and is
    /// reported in the outcome.
    pub async fn process_pending_uploads(&self) -> SweepOutcome {
        let job = match job_repo::find_pending(&self.db, JobStatus::PendingUpload, 1) {
            Ok(mut jobs) => match jobs.pop() {
                Some(job) => job,
                None => {
                    info!("No videos waiting for upload");
                    return SweepOutcome::Idle;
                }
            },
            Err(e) => {
                error!("Could not query pending uploads: {}", e);
                return SweepOutcome::Unavailable(e.to_string());
            }
        };

        let job_id = job.id;
        match self
            .publish_job(&job)
            .instrument(info_span!("upload", job_id))
            .await
        {
            Ok(remote_id) => match job_repo::update_status(&self.db, job_id, JobStatus::Completed) {
                Ok(()) => {
                    info!("Job {} published as {}", job_id, remote_id);
                    SweepOutcome::Published { job_id, remote_id }
                }
                Err(e) => {
                    error!("Job {} was published but could not be marked completed: {}", job_id, e);
                    SweepOutcome::Failed {
                        job_id,
                        error: e.to_string(),
                    }
                }
            },
            Err(e) => {
                error!("Upload of job {} failed: {}", job_id, e);
                if let Err(mark_err) = job_repo::update_status(&self.db, job_id, JobStatus::Failed) {
                    warn!("Could not mark job {} as failed: {}", job_id, mark_err);
                }
                SweepOutcome::Failed {
                    job_id,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn publish_job(&self, job: &JobRecord) -> Result<String, PipelineError> {
        let video_path = job
            .output_path
            .as_deref()
            .map(PathBuf::from)
            .ok_or(PipelineError::MissingMetadata(job.id))?;
        if !video_path.is_file() {
            return Err(PipelineError::MissingArtifact(video_path));
        }

        let script = job.script.clone().unwrap_or_default();
        let request = PublishRequest {
            title: job.title.clone().unwrap_or_else(|| derive_title(&script)),
            description: job.description.clone().unwrap_or(script),
            video_path,
            privacy_status: self.privacy_status,
        };

        info!("Uploading {}", sanitize::redact_path(&request.video_path));
        let access_token = self.tokens.get_valid_access_token().await?;
        self.publisher
            .publish(&access_token, &request)
            .await
            .map_err(PipelineError::Publish)
    }
}
