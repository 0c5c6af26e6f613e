//! OAuth 2.0 client-credentials exchange
//!
//! Posts `grant_type=client_credentials` with HTTP Basic auth to the token
//! endpoint. Only a timed-out exchange is retried; a rejection or a
//! malformed response aborts immediately, since neither will improve on a
//! second try.

use std::time::Duration;

use async_trait::async_trait;
use bibops_domain::config::{Credential, RetrySettings};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::resilience::{retry_fixed, FixedRetry, RetryDecision, RetryPolicy};

use super::traits::TokenFetcher;
use super::types::{TokenResponse, TokenSet};

/// Error type for token acquisition
#[derive(Debug, Error)]
pub enum TokenClientError {
    #[error("token request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("token endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to parse token response: {0}")]
    Parse(String),

    #[error("token request timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },
}

impl TokenClientError {
    fn is_timeout(&self) -> bool {
        match self {
            Self::RequestFailed(err) => err.is_timeout(),
            Self::TimedOut { .. } => true,
            _ => false,
        }
    }
}

struct TimeoutOnly;

impl RetryPolicy<TokenClientError> for TimeoutOnly {
    fn should_retry(&self, error: &TokenClientError, _attempt: u32) -> RetryDecision {
        if error.is_timeout() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Client-credentials token client for one institution.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: Client,
    token_url: String,
    credential: Credential,
    scopes: Vec<String>,
    retry: RetrySettings,
}

impl TokenClient {
    /// Build a token client with its own timeout budget.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        token_url: impl Into<String>,
        credential: Credential,
        scopes: Vec<String>,
        timeout: Duration,
        retry: RetrySettings,
    ) -> Result<Self, TokenClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, token_url: token_url.into(), credential, scopes, retry })
    }

    /// The scope list this client requests, space-joined for the form body.
    fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }

    async fn exchange(&self) -> Result<TokenSet, TokenClientError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.credential.client_id, Some(&self.credential.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", &self.scope_param())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TokenClientError::Rejected { status: status.as_u16(), body });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| TokenClientError::Parse(e.to_string()))?;
        let token: TokenSet = parsed.into();
        debug!(
            institution = %self.credential.institution_symbol,
            expires_in = token.expires_in,
            "fetched access token"
        );
        Ok(token)
    }
}

#[async_trait]
impl TokenFetcher for TokenClient {
    /// Fetch a fresh token, retrying only on timeout.
    async fn fetch_token(&self) -> Result<TokenSet, TokenClientError> {
        let budget = FixedRetry::new(self.retry.max_attempts, self.retry.retry_delay());

        retry_fixed(budget, TimeoutOnly, || self.exchange()).await.map_err(|err| {
            if err.is_exhausted() {
                TokenClientError::TimedOut { attempts: budget.max_attempts }
            } else {
                err.into_source()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Only timeout-shaped errors are retried by the token policy.
    #[test]
    fn test_timeout_policy() {
        let policy = TimeoutOnly;

        let rejected = TokenClientError::Rejected { status: 401, body: "bad client".into() };
        assert_eq!(policy.should_retry(&rejected, 1), RetryDecision::Stop);

        let parse = TokenClientError::Parse("eof".into());
        assert_eq!(policy.should_retry(&parse, 1), RetryDecision::Stop);

        let timed_out = TokenClientError::TimedOut { attempts: 3 };
        assert_eq!(policy.should_retry(&timed_out, 1), RetryDecision::Retry);
    }

    /// Scopes join with spaces for the form body.
    #[test]
    fn test_scope_param() {
        let client = TokenClient::new(
            "https://oauth.example/token",
            Credential {
                institution_symbol: "TS268".into(),
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
            vec!["WorldCatMetadataAPI:manage_bibs".into(), "WorldCatMetadataAPI:view_brief_bib".into()],
            Duration::from_secs(5),
            RetrySettings::default(),
        )
        .unwrap();

        assert_eq!(
            client.scope_param(),
            "WorldCatMetadataAPI:manage_bibs WorldCatMetadataAPI:view_brief_bib"
        );
    }
}
