//! Hands out valid access tokens, refreshing or re-authenticating as needed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use secrecy::SecretString;
use tokio::sync::Mutex;

use super::error::AuthError;
use super::store::CredentialStore;
use super::tokens::Tokens;

/// The two ways of obtaining tokens from the authorization server.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Full interactive consent. May block on the user for minutes.
    async fn authenticate(&self) -> Result<Tokens, AuthError>;

    /// Exchanges a refresh token. The returned `refresh_token` is `None`
    /// unless the server rotated it.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<Tokens, AuthError>;
}

/// Whether a token request may fall back to interactive consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    Interactive,
    RefreshOnly,
}

pub struct TokenProvider {
    store: CredentialStore,
    authenticator: Arc<dyn Authenticator>,
    /// Serializes token acquisition so concurrent callers share one refresh.
    gate: Mutex<()>,
}

impl TokenProvider {
    pub fn new(store: CredentialStore, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Returns an access token valid beyond the safety window.
    pub async fn get_valid_access_token(&self) -> Result<SecretString, AuthError> {
        let tokens = self.get_valid_tokens(AuthPolicy::Interactive).await?;
        Ok(SecretString::from(tokens.access_token))
    }

    /// Loads stored tokens and, if they are missing or expiring, refreshes
    /// them or (when `policy` allows) runs interactive consent.
    pub async fn get_valid_tokens(&self, policy: AuthPolicy) -> Result<Tokens, AuthError> {
        let _guard = self.gate.lock().await;

        let stored = match self.store.load() {
            Some(tokens) => tokens,
            None => {
                info!("No stored credentials");
                return self.reauthenticate(policy).await;
            }
        };

        if !stored.is_expiring(Utc::now()) {
            return Ok(stored);
        }

        let refresh_token = match stored.refresh_token.as_deref() {
            Some(token) if stored.can_refresh() => SecretString::from(token.to_string()),
            _ => {
                info!("Access token expired and no refresh token is stored");
                return self.reauthenticate(policy).await;
            }
        };

        match self.authenticator.refresh(&refresh_token).await {
            Ok(mut refreshed) => {
                if refreshed.refresh_token.is_none() {
                    refreshed.refresh_token = stored.refresh_token.clone();
                }
                self.store.save(&refreshed)?;
                info!("Access token refreshed, valid until {}", refreshed.expires_at);
                Ok(refreshed)
            }
            Err(e) if policy == AuthPolicy::Interactive => {
                warn!("Token refresh failed, falling back to interactive login: {}", e);
                self.reauthenticate_locked().await
            }
            Err(e) => Err(e),
        }
    }

    /// Runs interactive consent unconditionally and stores the result.
    pub async fn authenticate(&self) -> Result<Tokens, AuthError> {
        let _guard = self.gate.lock().await;
        self.reauthenticate_locked().await
    }

    async fn reauthenticate(&self, policy: AuthPolicy) -> Result<Tokens, AuthError> {
        match policy {
            AuthPolicy::Interactive => self.reauthenticate_locked().await,
            AuthPolicy::RefreshOnly => Err(AuthError::InteractionRequired),
        }
    }

    /// Caller must hold `gate`.
    async fn reauthenticate_locked(&self) -> Result<Tokens, AuthError> {
        let tokens = self.authenticator.authenticate().await?;
        self.store.save(&tokens)?;
        info!("Stored new credentials at {}", self.store.path().display());
        Ok(tokens)
    }
}
