use anyhow::{Context, Result};
use daily_algorithm::LogFormat;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
/// Records from the `log` facade are forwarded into tracing.
pub fn init(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(env_filter);
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to install log subscriber")?;
        }
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_thread_ids(false),
                )
                .with(env_filter);
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to install log subscriber")?;
        }
    }

    tracing_log::LogTracer::init().context("Failed to bridge log records")?;
    Ok(())
}
