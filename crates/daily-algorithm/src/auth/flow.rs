//! Interactive consent flow: open the browser (or print the URL), collect the
//! authorization code and exchange it for tokens.

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use secrecy::SecretString;

use super::callback::{self, CALLBACK_TIMEOUT};
use super::error::AuthError;
use super::oauth::GoogleOAuth;
use super::provider::Authenticator;
use super::tokens::Tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentMode {
    /// Launch the browser and catch the redirect on a local port.
    Browser { port: u16 },
    /// Print the URL and read the redirect URL or code from stdin.
    Manual,
}

pub struct InteractiveAuthenticator {
    oauth: Arc<GoogleOAuth>,
    mode: ConsentMode,
}

impl InteractiveAuthenticator {
    pub fn new(oauth: Arc<GoogleOAuth>, mode: ConsentMode) -> Self {
        Self { oauth, mode }
    }

    async fn collect_code(&self, url: &str, state: &str) -> Result<String, AuthError> {
        match self.mode {
            ConsentMode::Browser { port } => {
                let expected = state.to_string();
                let listener = tokio::task::spawn_blocking(move || {
                    callback::wait_for_code(port, &expected, CALLBACK_TIMEOUT)
                });

                eprintln!("Opening browser for authorization...");
                if let Err(e) = open::that(url) {
                    warn!("Could not open browser: {}", e);
                    eprintln!("Open this URL in your browser to continue:\n\n  {}\n", url);
                }

                listener
                    .await
                    .map_err(|e| AuthError::Callback(format!("Callback task failed: {}", e)))?
            }
            ConsentMode::Manual => {
                eprintln!("Open this URL in your browser to continue:\n\n  {}\n", url);
                eprintln!("After approving, paste the full redirect URL (or just the code) here:");

                let line = tokio::task::spawn_blocking(|| {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line).map(|_| line)
                })
                .await
                .map_err(|e| AuthError::Callback(format!("Input task failed: {}", e)))?
                .map_err(|e| AuthError::Callback(format!("Failed to read input: {}", e)))?;

                callback::parse_pasted(&line, state)
            }
        }
    }
}

#[async_trait]
impl Authenticator for InteractiveAuthenticator {
    async fn authenticate(&self) -> Result<Tokens, AuthError> {
        let request = self.oauth.authorization_request()?;
        let code = self.collect_code(request.url.as_str(), &request.state).await?;

        let response = self.oauth.exchange_code(&code, &request.pkce_verifier).await?;
        if response.refresh_token.is_none() {
            warn!("Authorization returned no refresh token; re-authentication will be needed on expiry");
        }
        info!("Authorization complete");

        let expires_in = response.expires_in_secs();
        Tokens::from_grant(
            response.access_token,
            response.refresh_token,
            expires_in,
            Utc::now(),
        )
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<Tokens, AuthError> {
        let response = self.oauth.refresh_access_token(refresh_token).await?;
        let expires_in = response.expires_in_secs();
        Tokens::from_grant(
            response.access_token,
            response.refresh_token,
            expires_in,
            Utc::now(),
        )
    }
}
