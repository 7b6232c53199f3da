use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};
use url::Url;

use crate::auth::TokenProvider;
use crate::cache::MediaVariant;
use crate::db::{job_repo, Database, DatabaseError};
use crate::error::{ExternalError, StorageError};
use crate::job::{JobFields, JobRecord, JobStatus};
use crate::narration::{Narration, SubtitleCue};
use crate::publish::PublishRequest;
use crate::render::{self, RenderProps};
use crate::sanitize;

use super::collaborators::Collaborators;
use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;

const TITLE_MAX_CHARS: usize = 100;

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    db: Database,
    services: Collaborators,
    tokens: Option<Arc<TokenProvider>>,
    cancel: Option<CancellationToken>,
}

/// Title used for publishing: the script cut to a fixed number of characters.
pub fn derive_title(script: &str) -> String {
    sanitize::truncate_chars(script.trim(), TITLE_MAX_CHARS)
}

impl Pipeline {
    pub fn new(config: Arc<PipelineConfig>, db: Database, services: Collaborators) -> Self {
        Self {
            config,
            db,
            services,
            tokens: None,
            cancel: None,
        }
    }

    /// Enables inline publishing with credentials from `tokens`.
    pub fn with_publishing(mut self, tokens: Arc<TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Checks `cancel` between stages. A stage in progress always runs to
    /// completion; the job is then marked `failed` with
    /// [`PipelineError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs one job from discovery to `pending_upload`, or to `completed`
    /// when `upload` is set. A failing stage marks the job `failed` and its
    /// error is returned unchanged.
    pub async fn generate(&self, upload: bool) -> Result<JobRecord, PipelineError> {
        if upload && self.tokens.is_none() {
            return Err(PipelineError::PublishingDisabled);
        }
        self.checkpoint()?;

        let job = job_repo::create(&self.db)?;
        let job_id = job.id;
        info!("Created job {}", job_id);

        let mut ctx = PipelineContext::new(job);
        let outcome = self
            .run_stages(&mut ctx, upload)
            .instrument(info_span!("pipeline", job_id, upload))
            .await;

        self.release_ai_files().await;

        match outcome {
            Ok(()) => {
                let record = job_repo::find_by_id(&self.db, job_id)?
                    .ok_or(DatabaseError::NotFound(job_id))?;
                info!("Job {} finished as {}", job_id, record.status);
                Ok(record)
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                if let Err(mark_err) = job_repo::update_status(&self.db, job_id, JobStatus::Failed) {
                    warn!("Could not mark job {} as failed: {}", job_id, mark_err);
                }
                Err(e)
            }
        }
    }

    /// Deletes every file uploaded to the AI service. Failures are only logged.
    pub async fn release_ai_files(&self) {
        match self.services.script_generator.release_all().await {
            Ok(0) => {}
            Ok(n) => debug!("Released {} uploaded AI files", n),
            Err(e) => warn!("Failed to release uploaded AI files: {}", e),
        }
    }

    async fn run_stages(&self, ctx: &mut PipelineContext, upload: bool) -> Result<(), PipelineError> {
        self.step_acquire_source(ctx)
            .instrument(info_span!("acquire_source"))
            .await?;

        self.checkpoint()?;
        self.step_write_script(ctx)
            .instrument(info_span!("write_script"))
            .await?;

        self.checkpoint()?;
        let narration = self
            .step_narrate(ctx)
            .instrument(info_span!("narrate"))
            .await?;

        self.checkpoint()?;
        self.step_stage_assets(ctx, &narration)
            .instrument(info_span!("stage_assets"))
            .await?;

        self.checkpoint()?;
        self.step_render(ctx, narration.subtitles)
            .instrument(info_span!("render"))
            .await?;

        if upload {
            self.checkpoint()?;
            self.step_publish(ctx)
                .instrument(info_span!("publish"))
                .await?;
        }
        Ok(())
    }

    /// Stops the run between stages once shutdown has been requested.
    fn checkpoint(&self) -> Result<(), PipelineError> {
        match &self.cancel {
            Some(cancel) if cancel.is_cancelled() => Err(PipelineError::Cancelled),
            _ => Ok(()),
        }
    }

    fn advance(&self, ctx: &mut PipelineContext, status: JobStatus) -> Result<(), PipelineError> {
        job_repo::update_status(&self.db, ctx.job.id, status)?;
        ctx.job.status = status;
        debug!("Job {} is now {}", ctx.job.id, status);
        Ok(())
    }

    /// Asks the finder for sources until one has not been used recently.
    /// Discovery failures count as attempts.
    async fn discover_unused_source(&self) -> Result<Url, PipelineError> {
        let attempts = self.config.max_discovery_attempts;
        let mut last_error: Option<ExternalError> = None;

        for attempt in 1..=attempts {
            let url = match self.services.source_finder.find_source().await {
                Ok(url) => url,
                Err(e) => {
                    warn!("Discovery attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                    continue;
                }
            };

            if job_repo::exists_duplicate(&self.db, url.as_str(), self.config.duplicate_window)? {
                info!(
                    "Skipping recently used source {} (attempt {}/{})",
                    sanitize::redact_url(url.as_str()),
                    attempt,
                    attempts
                );
                last_error = None;
                continue;
            }
            return Ok(url);
        }

        Err(match last_error {
            Some(e) => PipelineError::Discovery(e),
            None => PipelineError::DuplicateLimit { attempts },
        })
    }

    async fn step_acquire_source(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let url = self.discover_unused_source().await?;
        job_repo::set_source_url(&self.db, ctx.job.id, url.as_str())?;
        info!("Selected source {}", sanitize::redact_url(url.as_str()));

        let media_path = self
            .services
            .downloader
            .download(&url, MediaVariant::Video)
            .await
            .map_err(PipelineError::Download)?;
        debug!("Source media at {}", sanitize::redact_path(&media_path));

        ctx.media_path = Some(media_path);
        self.advance(ctx, JobStatus::PendingScript)
    }

    async fn step_write_script(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let media_path = ctx.media_path()?;
        let generator = &self.services.script_generator;
        let media = generator
            .upload_media(&media_path)
            .await
            .map_err(PipelineError::Script)?;
        let script = generator
            .generate_script(&media)
            .await
            .map_err(PipelineError::Script)?;

        let script = script.trim().to_string();
        if script.is_empty() {
            return Err(PipelineError::Script(ExternalError::InvalidResponse {
                service: "script generator".to_string(),
                message: "returned an empty script".to_string(),
            }));
        }
        info!("Generated a script of {} characters", script.chars().count());

        ctx.title = Some(derive_title(&script));
        ctx.script = Some(script);
        self.advance(ctx, JobStatus::PendingAudio)
    }

    async fn step_narrate(&self, ctx: &mut PipelineContext) -> Result<Narration, PipelineError> {
        let script = ctx.script()?;
        let narration = self
            .services
            .narrator
            .synthesize(&script)
            .await
            .map_err(PipelineError::Narration)?;
        self.advance(ctx, JobStatus::PendingRender)?;
        Ok(narration)
    }

    /// Writes the assets the composition reads under their fixed names.
    async fn step_stage_assets(
        &self,
        ctx: &PipelineContext,
        narration: &Narration,
    ) -> Result<(), PipelineError> {
        let media_path = ctx.media_path()?;
        let paths = &self.config.paths;
        create_dir(&paths.render_public_dir()).await?;

        let video = paths.staged_video();
        tokio::fs::copy(&media_path, &video)
            .await
            .map_err(|e| StorageError::CopyFile {
                from: media_path.clone(),
                to: video.clone(),
                source: e,
            })?;

        write_file(&paths.staged_audio(), &narration.audio).await?;
        write_file(&paths.staged_subtitles(), &subtitles_json(&narration.subtitles)?).await?;

        debug!(
            "Staged video, {} bytes of audio and {} subtitle cues",
            narration.audio.len(),
            narration.subtitles.len()
        );
        Ok(())
    }

    async fn step_render(
        &self,
        ctx: &mut PipelineContext,
        subtitles: Vec<SubtitleCue>,
    ) -> Result<(), PipelineError> {
        let script = ctx.script()?;
        let title = ctx.title()?;
        let paths = &self.config.paths;
        let public_dir = paths.render_public_dir();

        let bundle = self
            .services
            .bundler
            .bundle(&self.config.render_entry_point, &public_dir)
            .await
            .map_err(PipelineError::Render)?;
        render::sync_public_assets(&public_dir, &bundle)?;

        let props = RenderProps {
            audio_src: file_name(&paths.staged_audio()),
            video_src: file_name(&paths.staged_video()),
            subtitles,
        };
        let video = self
            .services
            .renderer
            .render(&bundle, &props, self.config.concurrency)
            .await
            .map_err(PipelineError::Render)?;

        let output_path = paths.output_path(&title, &script);
        if let Some(parent) = output_path.parent() {
            create_dir(parent).await?;
        }
        write_file(&output_path, &video).await?;
        info!(
            "Rendered {} ({} bytes)",
            sanitize::redact_path(&output_path),
            video.len()
        );

        ctx.job = job_repo::update_fields(
            &self.db,
            ctx.job.id,
            &JobFields {
                status: JobStatus::PendingUpload,
                description: script.clone(),
                script,
                title,
                output_path: output_path.to_string_lossy().into_owned(),
            },
        )?;
        ctx.output_path = Some(output_path);
        Ok(())
    }

    async fn step_publish(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let tokens = self.tokens.as_ref().ok_or(PipelineError::PublishingDisabled)?;
        let access_token = tokens.get_valid_access_token().await?;
        let request = PublishRequest {
            video_path: ctx.output_path()?,
            title: ctx.title()?,
            description: ctx.script()?,
            privacy_status: self.config.privacy_status,
        };

        let remote_id = self
            .services
            .publisher
            .publish(&access_token, &request)
            .await
            .map_err(PipelineError::Publish)?;
        info!("Published job {} as {}", ctx.job.id, remote_id);
        self.advance(ctx, JobStatus::Completed)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn subtitles_json(subtitles: &[SubtitleCue]) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(subtitles).map_err(|e| StorageError::WriteFile {
        path: PathBuf::from("subtitles.json"),
        source: std::io::Error::other(e),
    })
}

async fn create_dir(dir: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source: e,
        })
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
}
