//! OAuth2 authorization-code client for Google with PKCE.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::info;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use super::error::AuthError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

pub const CALLBACK_PATH: &str = "/auth/callback";

/// Maximum length for sanitized error bodies to prevent log flooding.
const MAX_ERROR_BODY_LENGTH: usize = 200;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google reports lifetimes; this is used only if a response omits it.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

fn sanitize_oauth_error_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((idx, _)) => format!("{}... (truncated)", &body[..idx]),
        None => body.to_string(),
    }
}

/// Response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Only returned on the first consent, or when the server rotates it.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn expires_in_secs(&self) -> u64 {
        self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS)
    }
}

/// A prepared consent-screen request.
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    pub pkce_verifier: SecretString,
}

pub struct GoogleOAuth {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
}

fn create_http_client() -> Result<Client, AuthError> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AuthError::OAuth(format!("Failed to create HTTP client: {}", e)))
}

/// Random, URL-safe string of 64 characters.
fn random_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// S256 code challenge for a PKCE verifier.
pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

impl GoogleOAuth {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        callback_port: u16,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client: create_http_client()?,
            client_id: client_id.into(),
            client_secret,
            redirect_uri: format!("http://localhost:{}{}", callback_port, CALLBACK_PATH),
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Overrides the token endpoint, e.g. to point at a local test server.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Builds the consent URL with offline access, a fresh state and a PKCE challenge.
    pub fn authorization_request(&self) -> Result<AuthorizationRequest, AuthError> {
        let state = random_token();
        let verifier = random_token();

        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| AuthError::OAuth(format!("Invalid authorization URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", UPLOAD_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce_challenge(&verifier))
            .append_pair("code_challenge_method", "S256");

        Ok(AuthorizationRequest {
            url,
            state,
            pkce_verifier: SecretString::from(verifier),
        })
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &SecretString,
    ) -> Result<TokenResponse, AuthError> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("code", code),
            ("code_verifier", pkce_verifier.expose_secret()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        self.post_token_request(&params, "Code exchange").await
    }

    /// Refresh an access token using a refresh token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &SecretString,
    ) -> Result<TokenResponse, AuthError> {
        info!("Refreshing access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        let token = self.post_token_request(&params, "Token refresh").await?;
        info!("Successfully refreshed access token");
        Ok(token)
    }

    async fn post_token_request(
        &self,
        params: &[(&str, &str)],
        action: &str,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("{} failed: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuth(format!(
                "{} failed ({}): {}",
                action,
                status,
                sanitize_oauth_error_body(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("Failed to parse {} response: {}", action, e)))
    }
}
