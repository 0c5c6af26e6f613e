//! Configuration structures
//!
//! Endpoint, credential and retry settings carried from the environment
//! into the token client and dispatcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_SECS,
    DEFAULT_SERVICE_URL, DEFAULT_TOKEN_TIMEOUT_SECS, DEFAULT_TOKEN_URL,
    TOKEN_REFRESH_INTERVAL_MINS,
};

/// One institution's client-credentials pair.
///
/// Looked up by institution symbol at process start and immutable
/// afterwards. The secret never appears in `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub institution_symbol: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("institution_symbol", &self.institution_symbol)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Per-unit retry settings shared by the token client and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempt budget per unit, initial try included.
    pub max_attempts: u32,
    /// Fixed delay between timeout retries, seconds.
    pub retry_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, retry_delay_secs: DEFAULT_RETRY_DELAY_SECS }
    }
}

impl RetrySettings {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Endpoint and timeout configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base path of the metadata service.
    pub service_url: String,
    /// OAuth2 token endpoint.
    pub token_url: String,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
    /// Token-endpoint timeout, seconds.
    pub token_timeout_secs: u64,
    /// Background refresh interval, minutes.
    pub refresh_interval_mins: u64,
    pub retry: RetrySettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_timeout_secs: DEFAULT_TOKEN_TIMEOUT_SECS,
            refresh_interval_mins: TOKEN_REFRESH_INTERVAL_MINS,
            retry: RetrySettings::default(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_mins * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults mirror the process-wide constants.
    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(50));
        assert_eq!(config.refresh_interval(), Duration::from_secs(18 * 60));
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.retry_delay(), Duration::from_secs(3));
    }

    /// The client secret never leaks through Debug formatting.
    #[test]
    fn test_credential_debug_redacts_secret() {
        let cred = Credential {
            institution_symbol: "TS268".into(),
            client_id: "id".into(),
            client_secret: "very-secret".into(),
        };
        let rendered = format!("{cred:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("very-secret"));
    }
}
