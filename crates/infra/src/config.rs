//! Environment configuration
//!
//! Credentials live in the environment (or a `.env` file next to the
//! working directory), one pair per institution symbol:
//! `{SYMBOL}_CLIENT_ID` and `{SYMBOL}_CLIENT_SECRET`. Endpoints and
//! timing knobs can be overridden for testing:
//! - `BIBOPS_SERVICE_URL`: metadata service base URL
//! - `BIBOPS_TOKEN_URL`: OAuth2 token endpoint
//! - `BIBOPS_REQUEST_TIMEOUT_SECS` / `BIBOPS_TOKEN_TIMEOUT_SECS`
//! - `BIBOPS_MAX_ATTEMPTS` / `BIBOPS_RETRY_DELAY_SECS`
//! - `BIBOPS_REFRESH_INTERVAL_MINS`

use std::str::FromStr;

use bibops_domain::config::{ApiConfig, Credential};
use tracing::debug;

use crate::errors::InfraError;

/// Load the credential pair for one institution symbol.
///
/// # Errors
/// Returns `InfraError::Config` naming the missing variable.
pub fn load_credential(symbol: &str) -> Result<Credential, InfraError> {
    // A missing .env file is fine; variables may come from the shell.
    dotenvy::dotenv().ok();

    let client_id = require_var(&format!("{symbol}_CLIENT_ID"))?;
    let client_secret = require_var(&format!("{symbol}_CLIENT_SECRET"))?;
    debug!(symbol, "credential loaded");

    Ok(Credential { institution_symbol: symbol.to_string(), client_id, client_secret })
}

/// Build the API configuration, applying any environment overrides on
/// top of the defaults.
#[must_use]
pub fn load_api_config() -> ApiConfig {
    dotenvy::dotenv().ok();

    let mut config = ApiConfig::default();
    if let Some(url) = optional_var("BIBOPS_SERVICE_URL") {
        config.service_url = url;
    }
    if let Some(url) = optional_var("BIBOPS_TOKEN_URL") {
        config.token_url = url;
    }
    override_parsed(&mut config.request_timeout_secs, "BIBOPS_REQUEST_TIMEOUT_SECS");
    override_parsed(&mut config.token_timeout_secs, "BIBOPS_TOKEN_TIMEOUT_SECS");
    override_parsed(&mut config.refresh_interval_mins, "BIBOPS_REFRESH_INTERVAL_MINS");
    override_parsed(&mut config.retry.max_attempts, "BIBOPS_MAX_ATTEMPTS");
    override_parsed(&mut config.retry.retry_delay_secs, "BIBOPS_RETRY_DELAY_SECS");
    config
}

fn require_var(name: &str) -> Result<String, InfraError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| InfraError::Config(format!("environment variable {name} is not set")))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn override_parsed<T: FromStr>(slot: &mut T, name: &str) {
    if let Some(parsed) = optional_var(name).and_then(|v| v.parse().ok()) {
        *slot = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Credentials resolve per symbol; a missing pair names the variable.
    #[test]
    fn test_credential_lookup() {
        std::env::set_var("ZZTST_CLIENT_ID", "id-1");
        std::env::set_var("ZZTST_CLIENT_SECRET", "secret-1");

        let credential = load_credential("ZZTST").unwrap();
        assert_eq!(credential.institution_symbol, "ZZTST");
        assert_eq!(credential.client_id, "id-1");

        let err = load_credential("ZZNOPE").unwrap_err();
        assert!(err.to_string().contains("ZZNOPE_CLIENT_ID"));

        std::env::remove_var("ZZTST_CLIENT_ID");
        std::env::remove_var("ZZTST_CLIENT_SECRET");
    }

    /// Unset overrides leave the defaults in place.
    #[test]
    fn test_default_api_config() {
        std::env::remove_var("BIBOPS_SERVICE_URL");
        let config = load_api_config();
        assert_eq!(config.service_url, bibops_domain::constants::DEFAULT_SERVICE_URL);
        assert_eq!(config.retry.max_attempts, 10);
    }
}
