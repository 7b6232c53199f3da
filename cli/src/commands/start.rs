use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use daily_algorithm::pipeline::SweepOutcome;
use daily_algorithm::publish::YouTubePublisher;
use daily_algorithm::service::{self, parse_schedule, FAILURE_BACKOFF};
use daily_algorithm::{RefreshScheduler, UploadSweep};
use log::info;

use crate::app::App;
use crate::signals;

#[derive(Subcommand)]
pub enum StartCommand {
    /// Start the automated video generation service
    Generate {
        /// Cron schedule expression (default from config: every 6 hours)
        #[arg(short, long, conflicts_with = "continuous")]
        schedule: Option<String>,

        /// Run continuously instead of using a schedule
        #[arg(short, long)]
        continuous: bool,

        /// Number of CPU cores to use for rendering (default: all cores)
        #[arg(short = 'n', long)]
        cores: Option<usize>,
    },

    /// Start the video upload service
    Upload {
        /// Cron schedule expression (default from config: every 4 hours)
        #[arg(short, long)]
        schedule: Option<String>,
    },
}

pub async fn run(app: &App, command: StartCommand) -> Result<()> {
    match command {
        StartCommand::Generate {
            schedule,
            continuous,
            cores,
        } => start_generate(app, schedule, continuous, cores).await,
        StartCommand::Upload { schedule } => start_upload(app, schedule).await,
    }
}

async fn start_generate(
    app: &App,
    schedule: Option<String>,
    continuous: bool,
    cores: Option<usize>,
) -> Result<()> {
    let db = app.open_database()?;
    let cancel = signals::shutdown_token()?;
    let pipeline = app
        .pipeline(db, cores, false)?
        .with_cancellation(cancel.clone());

    if continuous {
        info!("Continuous video generation started. Press Ctrl+C to stop.");
        service::run_continuous(cancel, FAILURE_BACKOFF, || pipeline.generate(false)).await;
    } else {
        let expression = schedule.unwrap_or_else(|| app.config.generate_schedule.clone());
        let schedule = parse_schedule(&expression)?;
        info!(
            "Video generation service started with schedule '{}'. Press Ctrl+C to stop.",
            expression
        );
        service::run_scheduled(schedule, cancel, true, || pipeline.generate(false)).await;
    }

    pipeline.release_ai_files().await;
    Ok(())
}

async fn start_upload(app: &App, schedule: Option<String>) -> Result<()> {
    let expression = schedule.unwrap_or_else(|| app.config.upload_schedule.clone());
    let schedule = parse_schedule(&expression)?;

    let db = app.open_database()?;
    let tokens = app.token_provider(false)?;
    let publisher = YouTubePublisher::new().context("Failed to set up the YouTube client")?;
    let sweep = UploadSweep::new(
        db,
        tokens.clone(),
        Arc::new(publisher),
        app.config.privacy_status,
    );

    let refresher = RefreshScheduler::new(tokens);
    refresher
        .start()
        .await
        .context("Failed to start background token refresh")?;

    let cancel = signals::shutdown_token()?;
    info!(
        "Video upload service started with schedule '{}'. Press Ctrl+C to stop.",
        expression
    );

    let sweep = &sweep;
    service::run_scheduled(schedule, cancel, false, || async move {
        if let SweepOutcome::Published { job_id, remote_id } = sweep.process_pending_uploads().await {
            info!("Uploaded job {} (video id {})", job_id, remote_id);
        }
        Ok::<(), Infallible>(())
    })
    .await;

    refresher.stop();
    Ok(())
}
