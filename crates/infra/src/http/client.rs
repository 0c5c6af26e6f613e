//! Shared reqwest client configuration
//!
//! One client per run, carrying the fixed request timeout. Retry lives in
//! the dispatcher, not here: the dispatcher needs to interleave retries
//! with token refreshes and marker checks, so a transport-level retry
//! loop would fight it.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("bibops/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client with the per-request timeout.
///
/// # Errors
/// Returns `InfraError::Http` when the TLS backend cannot initialize.
pub fn build_http_client(timeout: Duration) -> Result<Client, InfraError> {
    let client = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
    debug!(timeout_secs = timeout.as_secs(), "HTTP client built");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The client builds with the configured timeout.
    #[test]
    fn test_build_client() {
        assert!(build_http_client(Duration::from_secs(50)).is_ok());
    }
}
