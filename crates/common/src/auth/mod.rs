//! OAuth2 client-credentials authentication
//!
//! The metadata API issues short-lived bearer tokens (20 minutes) against
//! an institution's client id/secret pair. This module owns the whole
//! token lifecycle:
//!
//! - [`TokenClient`]: the client-credentials exchange itself, with a
//!   timeout-only retry budget
//! - [`TokenManager`]: the process-wide current token, swapped atomically
//!   on refresh
//! - [`TokenManager::spawn_auto_refresh`]: the background task that
//!   refreshes on a fixed interval, independent of request traffic

mod client;
mod token_manager;
mod traits;
mod types;

pub use client::{TokenClient, TokenClientError};
pub use token_manager::TokenManager;
pub use traits::TokenFetcher;
pub use types::{TokenResponse, TokenSet};
