//! Request dispatcher
//!
//! Sends one prepared request with a fixed per-unit attempt budget.
//! Three things interrupt the plain send-and-read path:
//! - the fatal quota marker, which cancels the whole run;
//! - a transient auth body, which triggers exactly one token refresh
//!   before the next attempt;
//! - a transport timeout, which waits the fixed delay and tries again.
//! Everything else is terminal for the unit. The final body, whatever it
//! is, goes back to the caller for classification.

use std::sync::Arc;

use bibops_common::auth::{TokenFetcher, TokenManager};
use bibops_domain::config::RetrySettings;
use bibops_domain::constants::{
    AUTH_REQUIRED_MARKER, BAD_GATEWAY_MARKER, HTML_BODY_MARKER, RATE_LIMIT_MARKER,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::operations::PreparedRequest;

/// Terminal state of one dispatched unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The service answered; the body awaits classification.
    Done(String),
    /// The attempt budget ran out or transport failed.
    GivenUp(GiveUpReason),
    /// The quota marker appeared; the run is cancelled.
    Aborted,
}

/// Why a unit was given up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiveUpReason {
    /// Every attempt timed out.
    Timeout,
    /// A non-timeout transport failure.
    Error(String),
}

/// One dispatch plus its retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub result: DispatchResult,
    /// Auth-marker responses seen (each one cost a token refresh).
    pub auth_retries: u32,
    /// Attempts lost to transport timeouts.
    pub timeouts: u32,
}

/// Sends prepared requests with retry, token refresh, and cancellation.
pub struct Dispatcher<F: TokenFetcher + 'static> {
    http: Client,
    tokens: Arc<TokenManager<F>>,
    retry: RetrySettings,
    cancel: CancellationToken,
}

impl<F: TokenFetcher + 'static> Dispatcher<F> {
    #[must_use]
    pub fn new(
        http: Client,
        tokens: Arc<TokenManager<F>>,
        retry: RetrySettings,
        cancel: CancellationToken,
    ) -> Self {
        Self { http, tokens, retry, cancel }
    }

    /// Whether the run has been cancelled (by this dispatcher or anyone
    /// else holding the token).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Send one prepared request until it resolves or the budget runs
    /// out.
    pub async fn dispatch(&self, request: &PreparedRequest) -> Dispatch {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut auth_retries = 0;
        let mut timeouts = 0;

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return Dispatch { result: DispatchResult::Aborted, auth_retries, timeouts };
            }

            let body = match self.send_once(request).await {
                Ok(body) => body,
                Err(err) if err.is_timeout() => {
                    timeouts += 1;
                    warn!(attempt, url = %request.url, "request timed out");
                    if attempt == max_attempts {
                        return Dispatch {
                            result: DispatchResult::GivenUp(GiveUpReason::Timeout),
                            auth_retries,
                            timeouts,
                        };
                    }
                    tokio::time::sleep(self.retry.retry_delay()).await;
                    continue;
                }
                Err(err) => {
                    error!(attempt, url = %request.url, error = %err, "request failed");
                    return Dispatch {
                        result: DispatchResult::GivenUp(GiveUpReason::Error(err.to_string())),
                        auth_retries,
                        timeouts,
                    };
                }
            };

            if body.contains(RATE_LIMIT_MARKER) {
                error!(url = %request.url, "quota exhausted, cancelling the run");
                self.cancel.cancel();
                return Dispatch { result: DispatchResult::Aborted, auth_retries, timeouts };
            }

            if is_auth_body(&body) {
                auth_retries += 1;
                warn!(attempt, url = %request.url, "auth marker in response, refreshing token");
                if attempt == max_attempts {
                    // Out of budget: hand the auth body back and let
                    // classification report it.
                    return Dispatch { result: DispatchResult::Done(body), auth_retries, timeouts };
                }
                if let Err(e) = self.tokens.refresh().await {
                    error!(error = %e, "token refresh after auth marker failed");
                }
                continue;
            }

            debug!(attempt, url = %request.url, "request resolved");
            return Dispatch { result: DispatchResult::Done(body), auth_retries, timeouts };
        }

        Dispatch {
            result: DispatchResult::GivenUp(GiveUpReason::Timeout),
            auth_retries,
            timeouts,
        }
    }

    async fn send_once(&self, request: &PreparedRequest) -> Result<String, reqwest::Error> {
        let mut builder = self.http.request(request.method.clone(), request.url.clone());

        if let Some(token) = self.tokens.bearer().await {
            builder = builder.bearer_auth(token);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(accept) = request.accept {
            builder = builder.header(ACCEPT, accept);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        response.text().await
    }
}

/// The transient auth shapes: a missing-credential message, or a gateway
/// answering with HTML instead of the service.
fn is_auth_body(body: &str) -> bool {
    body.contains(AUTH_REQUIRED_MARKER)
        || body.contains(HTML_BODY_MARKER)
        || body.contains(BAD_GATEWAY_MARKER)
}
