//! Credentials for remote solvers.
//!
//! Hosted services hand out a long-lived refresh token and exchange it for
//! short-lived access tokens. [`TokenProvider`] supplies the long-lived
//! token; [`CachedToken`] tracks an access token's expiry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Seconds before expiry at which an access token is refreshed.
pub const REFRESH_BUFFER_SECS: u64 = 60;

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A short-lived access token and its expiry (Unix seconds).
#[derive(Clone, Serialize, Deserialize)]
pub struct CachedToken {
    /// Bearer token.
    pub access_token: String,
    /// Expiry as Unix seconds.
    pub expires_at: u64,
}

impl CachedToken {
    /// Token expiring `expires_in` seconds from now.
    pub fn expiring_in(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: now_secs() + expires_in,
        }
    }

    /// Token expiring at an absolute time.
    pub fn expiring_at(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: u64::try_from(expires_at.timestamp()).unwrap_or(0),
        }
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        now_secs() >= self.expires_at
    }

    /// Check if the token expires within `buffer_secs`.
    pub fn expires_soon(&self, buffer_secs: u64) -> bool {
        now_secs() + buffer_secs >= self.expires_at
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of a long-lived API token.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get the token.
    async fn get_token(&self) -> HalResult<String>;

    /// Check whether a token is available without fetching it.
    fn has_valid_token(&self) -> bool;
}

/// Reads the token from an environment variable.
pub struct EnvTokenProvider {
    env_var: String,
}

impl EnvTokenProvider {
    /// Provider reading `env_var`.
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Provider for the hosted optimization service (`QCI_TOKEN`).
    pub fn qci() -> Self {
        Self::new("QCI_TOKEN")
    }
}

#[async_trait::async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn get_token(&self) -> HalResult<String> {
        std::env::var(&self.env_var).map_err(|_| {
            HalError::AuthenticationFailed(format!("Environment variable {} not set", self.env_var))
        })
    }

    fn has_valid_token(&self) -> bool {
        std::env::var(&self.env_var).is_ok_and(|v| !v.is_empty())
    }
}

/// A token fixed at construction, e.g. read from a config file.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Provider returning `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> HalResult<String> {
        Ok(self.token.clone())
    }

    fn has_valid_token(&self) -> bool {
        !self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let fresh = CachedToken::expiring_in("t", 3600);
        assert!(!fresh.is_expired());
        assert!(!fresh.expires_soon(REFRESH_BUFFER_SECS));

        let stale = CachedToken::expiring_in("t", 30);
        assert!(!stale.is_expired());
        assert!(stale.expires_soon(REFRESH_BUFFER_SECS));

        let expired = CachedToken {
            access_token: "t".into(),
            expires_at: 0,
        };
        assert!(expired.is_expired());
    }

    #[test]
    fn test_expiring_at() {
        let at = Utc::now() + chrono::Duration::hours(1);
        let token = CachedToken::expiring_at("t", at);
        assert!(!token.expires_soon(REFRESH_BUFFER_SECS));
    }

    #[test]
    fn test_debug_redacts() {
        let token = CachedToken::expiring_in("very-secret", 10);
        assert!(!format!("{token:?}").contains("very-secret"));
        let provider = StaticTokenProvider::new("very-secret");
        assert!(!format!("{provider:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn test_env_token_provider() {
        // SAFETY: test-only variable not read by other tests
        unsafe {
            std::env::set_var("OPTIQ_TEST_TOKEN_VAR_4711", "abc");
        }
        let provider = EnvTokenProvider::new("OPTIQ_TEST_TOKEN_VAR_4711");
        assert!(provider.has_valid_token());
        assert_eq!(provider.get_token().await.unwrap(), "abc");

        let missing = EnvTokenProvider::new("OPTIQ_NONEXISTENT_VAR_4711");
        assert!(!missing.has_valid_token());
        assert!(matches!(
            missing.get_token().await,
            Err(HalError::AuthenticationFailed(_))
        ));

        // SAFETY: cleaning up test variable
        unsafe {
            std::env::remove_var("OPTIQ_TEST_TOKEN_VAR_4711");
        }
    }

    #[tokio::test]
    async fn test_static_token_provider() {
        let provider = StaticTokenProvider::new("xyz");
        assert!(provider.has_valid_token());
        assert_eq!(provider.get_token().await.unwrap(), "xyz");
        assert!(!StaticTokenProvider::new("").has_valid_token());
    }
}
