use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

/// Exit status for a run stopped by a repeated interrupt.
const FORCED_EXIT_CODE: i32 = 130;

/// Returns a token cancelled on SIGINT or SIGTERM. A second signal exits
/// the process immediately.
pub fn shutdown_token() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            eprintln!("\nForced shutdown.");
            std::process::exit(FORCED_EXIT_CODE);
        }
        eprintln!("\nReceived shutdown signal. Finishing the current step...");
        handler_token.cancel();
    })
    .context("Failed to install signal handler")?;
    Ok(token)
}
