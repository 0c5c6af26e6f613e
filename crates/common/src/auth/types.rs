//! OAuth 2.0 token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An access token plus the metadata needed to reason about its lifetime.
///
/// Owned exclusively by the token manager and replaced wholesale on
/// refresh; readers always see the latest committed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer" for this API)
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// When this token was acquired (UTC)
    pub acquired_at: DateTime<Utc>,

    /// Absolute expiration timestamp, calculated at acquisition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a new `TokenSet`, stamping the acquisition time and
    /// calculating `expires_at` from `expires_in`.
    #[must_use]
    pub fn new(access_token: String, expires_in: i64, scope: Option<String>) -> Self {
        let acquired_at = Utc::now();
        let expires_at = if expires_in > 0 {
            Some(acquired_at + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            acquired_at,
            expires_at,
            scope,
        }
    }

    /// Whether the token is expired or will expire within `threshold_seconds`.
    /// Tokens without an expiry timestamp are assumed valid.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at,
            None => false,
        }
    }

    /// Seconds until expiry, or `None` when no expiry is set.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

/// Token response from the authorization server (RFC 6749).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenSet {
    fn from(resp: TokenResponse) -> Self {
        let mut set = TokenSet::new(resp.access_token, resp.expires_in.unwrap_or(0), resp.scope);
        if let Some(token_type) = resp.token_type {
            set.token_type = token_type;
        }
        set
    }
}
