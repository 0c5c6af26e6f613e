//! Seam between the token manager and the concrete token client

use async_trait::async_trait;

use super::client::TokenClientError;
use super::types::TokenSet;

/// Anything that can produce a fresh token set.
///
/// The token manager is generic over this so tests can drive it without a
/// live authorization server.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenSet, TokenClientError>;
}
