//! Resilience primitives
//!
//! Retry support for operations that fail transiently. The token client
//! and the dispatcher both run on fixed-delay budgets, so only the fixed
//! strategy is provided.

mod retry;

pub use retry::{retry_fixed, FixedRetry, RetryDecision, RetryError, RetryPolicy};
