//! Access/refresh token pair with an absolute expiry.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Tokens this close to expiry are treated as already expired.
pub const EXPIRY_SAFETY_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Tokens {
    /// Builds tokens from a grant whose lifetime is relative to `now`.
    ///
    /// A lifetime that does not fit a timestamp is rejected as a malformed
    /// grant.
    pub fn from_grant(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let expires_at = i64::try_from(expires_in_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|expires_in| now.checked_add_signed(expires_in))
            .ok_or_else(|| {
                AuthError::OAuth(format!(
                    "token lifetime of {}s is out of range",
                    expires_in_secs
                ))
            })?;
        Ok(Self {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Whether the remaining lifetime is within the safety window.
    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        let remaining = self.expires_at - now;
        remaining.to_std().map_or(true, |r| r <= EXPIRY_SAFETY_WINDOW)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Time until the tokens enter the safety window (zero if already inside).
    pub fn refresh_delay(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now)
            .to_std()
            .map(|remaining| remaining.saturating_sub(EXPIRY_SAFETY_WINDOW))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_expiring_in(secs: i64, now: DateTime<Utc>) -> Tokens {
        Tokens {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: now + chrono::Duration::seconds(secs),
        }
    }

    #[test]
    fn test_is_expiring_boundaries() {
        let now = Utc::now();
        assert!(tokens_expiring_in(-10, now).is_expiring(now));
        assert!(tokens_expiring_in(60, now).is_expiring(now));
        assert!(tokens_expiring_in(300, now).is_expiring(now));
        assert!(!tokens_expiring_in(301, now).is_expiring(now));
        assert!(!tokens_expiring_in(3600, now).is_expiring(now));
    }

    #[test]
    fn test_refresh_delay() {
        let now = Utc::now();
        assert_eq!(
            tokens_expiring_in(3600, now).refresh_delay(now),
            Duration::from_secs(3300)
        );
        assert_eq!(tokens_expiring_in(120, now).refresh_delay(now), Duration::ZERO);
        assert_eq!(tokens_expiring_in(-5, now).refresh_delay(now), Duration::ZERO);
    }

    #[test]
    fn test_from_grant() {
        let now = Utc::now();
        let tokens = Tokens::from_grant("a".into(), None, 3599, now).unwrap();
        assert_eq!(tokens.expires_at, now + chrono::Duration::seconds(3599));
        assert!(!tokens.can_refresh());
    }

    #[test]
    fn test_from_grant_rejects_out_of_range_lifetime() {
        let now = Utc::now();
        for expires_in in [u64::MAX, i64::MAX as u64, i64::MAX as u64 / 1000 + 1] {
            let err = Tokens::from_grant("a".into(), None, expires_in, now).unwrap_err();
            assert!(matches!(err, AuthError::OAuth(_)), "{}: {}", expires_in, err);
        }
    }

    #[test]
    fn test_from_grant_rejects_expiry_past_max_timestamp() {
        // 300k years fits a TimeDelta but lands past chrono's last year.
        let year: u64 = 366 * 24 * 3600;
        let err = Tokens::from_grant("a".into(), None, 300_000 * year, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::OAuth(_)));
    }

    #[test]
    fn test_can_refresh_requires_non_empty_token() {
        let now = Utc::now();
        let mut tokens = tokens_expiring_in(10, now);
        assert!(tokens.can_refresh());
        tokens.refresh_token = Some(String::new());
        assert!(!tokens.can_refresh());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let tokens = tokens_expiring_in(10, Utc::now());
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains("access\""));
        assert!(!debug.contains("\"refresh\""));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_serialized_field_names() {
        let tokens = tokens_expiring_in(10, Utc::now());
        let json = serde_json::to_value(&tokens).unwrap();
        assert!(json.get("accessToken").is_some());
        assert!(json.get("refreshToken").is_some());
        assert!(json.get("expiresAt").is_some());
    }
}
