//! Fixed-delay retry executor with pluggable retry conditions
//!
//! An operation is attempted up to a budget; after each failure the policy
//! decides whether the error is worth another attempt. Retryable failures
//! sleep a fixed delay before the next try, non-retryable ones surface
//! immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted
    #[error("all {attempts} attempts exhausted: {source}")]
    AttemptsExhausted { attempts: u32, source: E },

    /// The operation failed with a non-retryable error
    #[error("non-retryable error: {source}")]
    NonRetryable { source: E },
}

impl<E> RetryError<E> {
    /// The underlying error, whichever way the retry ended.
    pub fn into_source(self) -> E {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source } => source,
        }
    }

    /// Whether the budget ran out (as opposed to an immediate stop).
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::AttemptsExhausted { .. })
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the configured fixed delay
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Attempt budget plus the fixed delay between retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRetry {
    /// Total attempts, initial try included. Clamped to at least 1.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl FixedRetry {
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }
}

/// Execute `operation` under `config`, consulting `policy` after each
/// failure.
///
/// Attempts are numbered from 1. The policy sees the attempt that just
/// failed, so it can stop early even with budget remaining.
pub async fn retry_fixed<F, Fut, T, E, P>(
    config: FixedRetry,
    policy: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: RetryPolicy<E>,
    E: fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        debug!(attempt, max_attempts, "executing operation");

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt == max_attempts {
                    warn!(attempt, %error, "attempt budget exhausted");
                    return Err(RetryError::AttemptsExhausted { attempts: attempt, source: error });
                }
                match policy.should_retry(&error, attempt) {
                    RetryDecision::Stop => {
                        debug!(%error, "policy stopped retrying");
                        return Err(RetryError::NonRetryable { source: error });
                    }
                    RetryDecision::Retry => {
                        warn!(attempt, %error, delay = ?config.delay, "retrying after delay");
                        if !config.delay.is_zero() {
                            tokio::time::sleep(config.delay).await;
                        }
                    }
                }
            }
        }
    }

    // max_attempts >= 1, so the loop always returns before this point.
    unreachable!("retry loop returned without a result")
}

#[cfg(test)]
mod tests {
    //! Unit tests for the fixed-delay retry executor.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Always(RetryDecision);

    impl<E> RetryPolicy<E> for Always {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            self.0
        }
    }

    /// Succeeds once the transient condition clears; the attempt counter
    /// reflects each call exactly once.
    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&counter);

        let result = retry_fixed(
            FixedRetry::new(5, Duration::ZERO),
            Always(RetryDecision::Retry),
            || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("transient")
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    /// A persistent failure exhausts exactly the attempt budget, never more.
    #[tokio::test]
    async fn test_retry_exhausts_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&counter);

        let result: Result<(), _> = retry_fixed(
            FixedRetry::new(3, Duration::ZERO),
            Always(RetryDecision::Retry),
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("persistent")
                }
            },
        )
        .await;

        match result {
            Err(RetryError::AttemptsExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected AttemptsExhausted, got {other:?}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    /// A stop decision surfaces the error after a single attempt.
    #[tokio::test]
    async fn test_retry_stops_on_non_retryable() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&counter);

        let result: Result<(), _> = retry_fixed(
            FixedRetry::new(10, Duration::ZERO),
            Always(RetryDecision::Stop),
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("fatal")
                }
            },
        )
        .await;

        assert!(matches!(result, Err(RetryError::NonRetryable { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    /// A predicate-style policy can stop based on the error value.
    #[tokio::test]
    async fn test_policy_sees_error_value() {
        struct OnlyTimeouts;

        impl RetryPolicy<&'static str> for OnlyTimeouts {
            fn should_retry(&self, error: &&'static str, _attempt: u32) -> RetryDecision {
                if error.contains("timeout") {
                    RetryDecision::Retry
                } else {
                    RetryDecision::Stop
                }
            }
        }

        let result: Result<(), _> =
            retry_fixed(FixedRetry::new(4, Duration::ZERO), OnlyTimeouts, || async {
                Err("connection refused")
            })
            .await;
        assert!(matches!(result, Err(RetryError::NonRetryable { .. })));

        let result: Result<(), _> =
            retry_fixed(FixedRetry::new(2, Duration::ZERO), OnlyTimeouts, || async {
                Err("timeout")
            })
            .await;
        assert!(matches!(result, Err(RetryError::AttemptsExhausted { attempts: 2, .. })));
    }

    /// A zero budget is clamped to one attempt rather than never running.
    #[tokio::test]
    async fn test_zero_budget_clamps_to_one() {
        let result =
            retry_fixed(FixedRetry::new(0, Duration::ZERO), Always(RetryDecision::Retry), || async {
                Ok::<_, &str>(1)
            })
            .await;
        assert_eq!(result.ok(), Some(1));
    }

    /// Error accessors expose the underlying source either way.
    #[test]
    fn test_retry_error_accessors() {
        let err = RetryError::AttemptsExhausted { attempts: 5, source: "e" };
        assert!(err.is_exhausted());
        assert_eq!(err.into_source(), "e");

        let err = RetryError::NonRetryable { source: "f" };
        assert!(!err.is_exhausted());
        assert_eq!(err.into_source(), "f");
    }
}
