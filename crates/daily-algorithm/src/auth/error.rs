//! Authentication error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The authorization server rejected a request or was unreachable.
    #[error("OAuth2 request failed: {0}")]
    OAuth(String),

    #[error("Authorization callback failed: {0}")]
    Callback(String),

    /// The consent screen reported an error (e.g. the user denied access).
    #[error("Authorization was denied: {0}")]
    Denied(String),

    #[error("Authorization response state does not match the request")]
    StateMismatch,

    #[error("Timed out waiting for authorization after {0}s")]
    Timeout(u64),

    /// Non-interactive callers hit a state only a user can resolve.
    #[error("Interactive authentication required: run `tda auth`")]
    InteractionRequired,

    #[error("Refusing to store tokens that are already expired")]
    ExpiredTokens,

    #[error("Credential store IO error for '{path}': {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize tokens: {0}")]
    Serialize(#[from] serde_json::Error),
}
