//! Run wiring
//!
//! Builds everything one run needs: configuration and credentials from
//! the environment, the token manager (initialized before any input is
//! read, so a bad credential fails the run immediately), the background
//! refresh task, and the dispatcher. All of it shares one cancellation
//! token; the quota abort stops the refresh task along with the run
//! loop.

use std::sync::Arc;

use bibops_common::auth::{TokenClient, TokenManager};
use bibops_domain::config::ApiConfig;
use bibops_domain::errors::BibopsError;
use bibops_infra::{build_http_client, config, Dispatcher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct RunContext {
    pub config: ApiConfig,
    pub symbol: String,
    pub dispatcher: Dispatcher<TokenClient>,
    cancel: CancellationToken,
    refresh_task: JoinHandle<()>,
}

impl RunContext {
    /// Wire up one run for the given institution symbol and scopes.
    ///
    /// # Errors
    /// Fails on missing credentials, an unbuildable HTTP client, or a
    /// failed initial token fetch.
    pub async fn initialize(symbol: &str, scopes: &[&str]) -> Result<Self, BibopsError> {
        let api_config = config::load_api_config();
        let credential = config::load_credential(symbol).map_err(BibopsError::from)?;

        let token_client = TokenClient::new(
            api_config.token_url.clone(),
            credential,
            scopes.iter().map(ToString::to_string).collect(),
            api_config.token_timeout(),
            api_config.retry.clone(),
        )
        .map_err(|e| BibopsError::Auth(e.to_string()))?;

        let tokens = Arc::new(TokenManager::new(token_client));
        tokens
            .initialize()
            .await
            .map_err(|e| BibopsError::Auth(format!("initial token fetch failed: {e}")))?;

        let cancel = CancellationToken::new();
        let refresh_task = tokens.spawn_auto_refresh(api_config.refresh_interval(), cancel.clone());

        let http = build_http_client(api_config.request_timeout()).map_err(BibopsError::from)?;
        let dispatcher =
            Dispatcher::new(http, Arc::clone(&tokens), api_config.retry.clone(), cancel.clone());

        info!(symbol, service_url = %api_config.service_url, "run context initialized");
        Ok(Self {
            config: api_config,
            symbol: symbol.to_string(),
            dispatcher,
            cancel,
            refresh_task,
        })
    }

    /// Whether the quota marker has cancelled this run.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the background refresh task and wait for it.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.refresh_task.await {
            warn!(error = %e, "refresh task did not shut down cleanly");
        }
    }
}
