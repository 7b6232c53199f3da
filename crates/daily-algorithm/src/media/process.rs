//! Subprocess execution with a deadline.

use std::ffi::OsStr;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ExternalError;

/// Longest stderr excerpt carried in an error.
const MAX_STDERR_LENGTH: usize = 500;

#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program` to completion, killing it if `timeout` passes first.
/// A non-zero exit status becomes `ExternalError::CommandFailed`.
pub async fn run_command<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<CommandOutput, ExternalError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    log::debug!("Running {}", program);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|e| ExternalError::Spawn {
            program: program.to_string(),
            source: e,
        })?,
        Err(_) => {
            return Err(ExternalError::CommandTimeout {
                program: program.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(ExternalError::CommandFailed {
            program: program.to_string(),
            message: format_failure(output.status.code(), &stderr),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

fn format_failure(code: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    let excerpt = match stderr.char_indices().nth(MAX_STDERR_LENGTH) {
        Some((idx, _)) => format!("{}...", &stderr[..idx]),
        None => stderr.to_string(),
    };
    match code {
        Some(code) if excerpt.is_empty() => format!("exit code {}", code),
        Some(code) => format!("exit code {}: {}", code, excerpt),
        None if excerpt.is_empty() => "terminated by signal".to_string(),
        None => format!("terminated by signal: {}", excerpt),
    }
}
