//! Secret resolution from the environment.
//!
//! Each secret is read from its environment variable, or from the file named
//! by `<NAME>_FILE` (Docker secrets pattern) when the variable itself is unset.

use std::fs;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";

/// Resolves a required secret, failing if neither source yields a non-empty value.
pub fn require_secret(name: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(name) {
        let value = value.trim();
        if !value.is_empty() {
            return Ok(SecretString::from(value.to_string()));
        }
    }

    let file_var = format!("{}_FILE", name);
    if let Ok(path) = std::env::var(&file_var) {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone().into(),
            source: e,
        })?;
        let content = content.trim();
        if !content.is_empty() {
            return Ok(SecretString::from(content.to_string()));
        }
    }

    Err(ConfigError::MissingSecret {
        name: name.to_string(),
    })
}

/// OAuth client registration for the publishing account.
#[derive(Debug)]
pub struct GoogleClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl GoogleClientCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = require_secret(GOOGLE_CLIENT_ID)?;
        let client_secret = require_secret(GOOGLE_CLIENT_SECRET)?;
        Ok(Self {
            client_id: client_id.expose_secret().to_string(),
            client_secret,
        })
    }
}
