use anyhow::Result;
use daily_algorithm::{JobStatus, PipelineError};
use log::{info, warn};

use crate::app::App;
use crate::signals;

pub async fn run(app: &App, upload: bool, cores: Option<usize>) -> Result<()> {
    let db = app.open_database()?;
    let cancel = signals::shutdown_token()?;
    let pipeline = app.pipeline(db, cores, upload)?.with_cancellation(cancel);

    let job = match pipeline.generate(upload).await {
        Ok(job) => job,
        Err(PipelineError::Cancelled) => {
            warn!("Generation interrupted; the job was marked failed");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    match job.status {
        JobStatus::Completed => info!("Job {} rendered and published", job.id),
        _ => info!(
            "Job {} rendered to {}",
            job.id,
            job.output_path.as_deref().unwrap_or("<unknown>")
        ),
    }
    Ok(())
}
