//! Background token refresh.
//!
//! One timer per scheduler. Each cycle refreshes (non-interactively) and
//! schedules the next cycle for when the new tokens enter the safety window.
//! A failed cycle is logged and ends the loop; the next explicit token
//! request retries synchronously.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::AuthError;
use super::provider::{AuthPolicy, TokenProvider};

/// Lower bound between cycles, so a server handing out short-lived tokens
/// cannot drive the loop into a busy spin.
pub const DEFAULT_MIN_REFRESH_DELAY: Duration = Duration::from_secs(30);

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct RefreshScheduler {
    provider: Arc<TokenProvider>,
    min_delay: Duration,
    running: Mutex<Option<Running>>,
}

impl RefreshScheduler {
    pub fn new(provider: Arc<TokenProvider>) -> Self {
        Self::with_min_delay(provider, DEFAULT_MIN_REFRESH_DELAY)
    }

    pub fn with_min_delay(provider: Arc<TokenProvider>, min_delay: Duration) -> Self {
        Self {
            provider,
            min_delay,
            running: Mutex::new(None),
        }
    }

    /// Ensures valid tokens (authenticating interactively if needed) and
    /// starts the refresh timer. Does nothing if a timer is already running.
    pub async fn start(&self) -> Result<(), AuthError> {
        if self.is_running() {
            log::debug!("Token refresh scheduler already running");
            return Ok(());
        }

        let tokens = self.provider.get_valid_tokens(AuthPolicy::Interactive).await?;
        let delay = tokens.refresh_delay(Utc::now()).max(self.min_delay);

        let mut running = self.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(
            Arc::clone(&self.provider),
            cancel.clone(),
            delay,
            self.min_delay,
        ));
        *running = Some(Running { cancel, handle });
        log::info!("Token refresh scheduler started");
        Ok(())
    }

    /// Cancels the pending timer. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(running) = self.lock().take() {
            running.cancel.cancel();
            log::info!("Token refresh scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_loop(
    provider: Arc<TokenProvider>,
    cancel: CancellationToken,
    first_delay: Duration,
    min_delay: Duration,
) {
    let mut delay = first_delay;
    loop {
        log::info!("Next token refresh in {}s", delay.as_secs());

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        match provider.get_valid_tokens(AuthPolicy::RefreshOnly).await {
            Ok(tokens) => {
                delay = tokens.refresh_delay(Utc::now()).max(min_delay);
            }
            Err(e) => {
                log::error!("Scheduled token refresh failed: {}", e);
                break;
            }
        }
    }
}
