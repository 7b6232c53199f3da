//! File-backed token persistence.
//!
//! Writes go through a temporary file in the same directory followed by a
//! rename, so a crash never leaves a half-written token file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::error::AuthError;
use super::tokens::Tokens;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists `tokens`, replacing whatever was stored.
    pub fn save(&self, tokens: &Tokens) -> Result<(), AuthError> {
        if tokens.expires_at <= Utc::now() {
            return Err(AuthError::ExpiredTokens);
        }

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let json = serde_json::to_vec_pretty(tokens)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        log::debug!("Saved tokens to {}", self.path.display());
        Ok(())
    }

    /// Loads stored tokens. Missing, unreadable or malformed files all read
    /// as "no tokens" so callers fall back to authenticating again.
    pub fn load(&self) -> Option<Tokens> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Failed to read tokens from {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                log::warn!("Ignoring malformed token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> AuthError {
        AuthError::Store {
            path: self.path.clone(),
            source,
        }
    }
}
