//! Long-running service loops: cron-scheduled and back-to-back execution.
//!
//! Both loops stop when the cancellation token fires. A task already in
//! flight is awaited to the end; the token is only consulted between runs
//! and while waiting.

use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;

/// Pause after a failed run in continuous mode.
pub const FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// Parses a cron expression. Five-field expressions (no seconds) get a
/// leading `0` seconds field.
pub fn parse_schedule(expression: &str) -> Result<Schedule, ConfigError> {
    let trimmed = expression.trim();
    let normalized = if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    };

    Schedule::from_str(&normalized).map_err(|e| ConfigError::InvalidSchedule {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Runs `task` back-to-back until cancelled, sleeping `backoff` after a failure.
pub async fn run_continuous<F, Fut, T, E>(cancel: CancellationToken, backoff: Duration, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    log::info!("Continuous mode started");
    while !cancel.is_cancelled() {
        if let Err(e) = task().await {
            log::error!("Run failed, retrying in {}s: {}", backoff.as_secs(), e);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }
    log::info!("Continuous mode stopped");
}

/// Runs `task` at every upcoming time of `schedule` until cancelled.
/// With `run_immediately`, one run happens before the first scheduled time.
/// Failures are logged and the schedule continues.
pub async fn run_scheduled<F, Fut, T, E>(
    schedule: Schedule,
    cancel: CancellationToken,
    run_immediately: bool,
    mut task: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    if run_immediately && !run_once(&cancel, &mut task).await {
        return;
    }

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            log::warn!("Schedule has no upcoming runs; stopping");
            break;
        };
        let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        log::info!("Next scheduled run at {}", next.to_rfc3339());

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        if !run_once(&cancel, &mut task).await {
            break;
        }
    }
    log::info!("Scheduler stopped");
}

/// Runs the task to completion. Returns false if shutdown was requested
/// meanwhile.
async fn run_once<F, Fut, T, E>(cancel: &CancellationToken, task: &mut F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    if let Err(e) = task().await {
        log::error!("Scheduled run failed: {}", e);
    }
    !cancel.is_cancelled()
}
