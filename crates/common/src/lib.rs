//! # bibops Common
//!
//! Cross-cutting utilities with no knowledge of MARC records or the
//! metadata API's operations:
//!
//! - [`resilience`]: a small fixed-delay retry executor with pluggable
//!   retry policies
//! - [`auth`]: OAuth2 client-credentials token acquisition, the shared
//!   token manager, and its background refresh task

pub mod auth;
pub mod resilience;

pub use auth::{TokenClient, TokenClientError, TokenFetcher, TokenManager, TokenSet};
pub use resilience::{retry_fixed, RetryDecision, RetryError, RetryPolicy};
