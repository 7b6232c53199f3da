use anyhow::{Context, Result};
use daily_algorithm::auth::AuthPolicy;
use log::info;

use crate::app::App;

pub async fn run(app: &App, manual: bool, force: bool) -> Result<()> {
    app.paths
        .ensure_directories()
        .context("Failed to create application directories")?;
    let provider = app.token_provider(manual)?;

    let tokens = if force {
        provider.authenticate().await?
    } else {
        provider.get_valid_tokens(AuthPolicy::Interactive).await?
    };

    info!(
        "Authenticated; access token valid until {}{}",
        tokens.expires_at.to_rfc3339(),
        if tokens.can_refresh() { "" } else { " (no refresh token)" }
    );
    Ok(())
}
