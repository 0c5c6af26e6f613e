//! Token manager with background refresh
//!
//! Owns the process-wide current token. The dispatcher's main loop and the
//! background refresh task both replace it; readers borrow a snapshot by
//! value, so an in-flight request keeps whatever token it started with and
//! a stale token is discovered through the auth-error retry path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::client::TokenClientError;
use super::traits::TokenFetcher;
use super::types::TokenSet;

/// Shared owner of the current access token.
pub struct TokenManager<F: TokenFetcher + 'static> {
    fetcher: Arc<F>,
    current: Arc<RwLock<Option<TokenSet>>>,
}

impl<F: TokenFetcher + 'static> TokenManager<F> {
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self { fetcher: Arc::new(fetcher), current: Arc::new(RwLock::new(None)) }
    }

    /// Acquire the initial token. Called once at startup, before any input
    /// is read; failure aborts the run rather than deferring the error to
    /// the first request.
    ///
    /// # Errors
    /// Propagates the token client's failure.
    pub async fn initialize(&self) -> Result<(), TokenClientError> {
        self.refresh().await?;
        info!("token manager initialized");
        Ok(())
    }

    /// Fetch a fresh token and commit it as the current one.
    ///
    /// # Errors
    /// Propagates the token client's failure; the previous token (if any)
    /// stays committed.
    pub async fn refresh(&self) -> Result<(), TokenClientError> {
        let token = self.fetcher.fetch_token().await?;
        *self.current.write().await = Some(token);
        debug!("access token replaced");
        Ok(())
    }

    /// Snapshot of the current bearer token value, if any.
    pub async fn bearer(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|t| t.access_token.clone())
    }

    /// Snapshot of the whole current token set.
    pub async fn current(&self) -> Option<TokenSet> {
        self.current.read().await.clone()
    }

    /// Whether a token has been committed.
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Start the background refresh task.
    ///
    /// Sleeps the fixed interval, then refreshes unconditionally; the
    /// interval is chosen below the token lifetime, so traffic never sees
    /// an expired token under normal operation. Refresh failure is logged
    /// and left for the next dispatch attempt's auth-error branch to
    /// repair. Terminates only through the cancellation token.
    pub fn spawn_auto_refresh(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "token auto-refresh task started");
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("token auto-refresh task stopping");
                        break;
                    }
                    () = tokio::time::sleep(interval) => {
                        debug!("scheduled token refresh");
                        if let Err(e) = manager.refresh().await {
                            error!(error = %e, "scheduled token refresh failed");
                        }
                    }
                }
            }
        })
    }
}
