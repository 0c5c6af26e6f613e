//! Work units and classified outcomes

use serde::{Deserialize, Serialize};

/// One unit of work submitted as a single API call.
///
/// Either a single MARC21 record (raw bytes plus the display identifier
/// derived from it), or a batch of control-number lines for the lookup
/// flow. Created by the record source, consumed exactly once by the
/// dispatcher, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkUnit {
    /// A single bibliographic or holdings record.
    Record {
        /// Raw record bytes, without the trailing group separator.
        bytes: Vec<u8>,
        /// Display identifier, or `None` when extraction failed. A unit
        /// without an identifier is never dispatched; it surfaces as an
        /// `Unknown` outcome instead.
        identifier: Option<String>,
    },
    /// Up to 100 input lines, each a bare control number or
    /// `local_id<TAB>control_number`.
    Batch {
        /// The input lines, trimmed, in input order.
        lines: Vec<String>,
    },
}

impl WorkUnit {
    /// Display identifier for logs and output files.
    ///
    /// Records show their extracted identifier; batches show the control
    /// number of their first line.
    #[must_use]
    pub fn display_identifier(&self) -> &str {
        match self {
            Self::Record { identifier, .. } => identifier.as_deref().unwrap_or("<no identifier>"),
            Self::Batch { lines } => lines.first().map_or("<empty batch>", |l| l.as_str()),
        }
    }
}

/// Category of a classified response.
///
/// Ordered by classification precedence: the first matching category wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeCategory {
    /// The fatal quota marker. Stops the whole run.
    RateLimited,
    /// Missing or stale credential, or a gateway body. Handled by the
    /// dispatcher (refresh + retry) before classification in practice.
    AuthError,
    /// The response carries a MARC record (field terminator present).
    Success,
    /// Structured error typed `NOT_FOUND`.
    NotFound,
    /// Structured error typed `BAD_REQUEST` or any other parsed error.
    BadRequest,
    /// The request never completed within the attempt budget.
    Timeout,
    /// Nothing matched. Treated as a data problem, not retried.
    Unknown,
}

impl OutcomeCategory {
    /// Whether the dispatcher should retry a unit in this category.
    /// Only auth errors and timeouts are transient; rate limiting is
    /// fatal and everything else is terminal per unit.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::AuthError | Self::Timeout)
    }
}

impl std::fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RateLimited => "rate-limited",
            Self::AuthError => "auth-error",
            Self::Success => "success",
            Self::NotFound => "not-found",
            Self::BadRequest => "bad-request",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The terminal result of processing one work unit.
///
/// Invariant: every work unit yields exactly one `Outcome`. The payload is
/// written to the matching category sink immediately and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Display identifier of the originating unit.
    pub identifier: String,
    pub category: OutcomeCategory,
    /// Decoded response body, or a short diagnostic for given-up units.
    pub payload: String,
}

impl Outcome {
    #[must_use]
    pub fn new(identifier: impl Into<String>, category: OutcomeCategory, payload: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), category, payload: payload.into() }
    }
}

/// Result of comparing a requested control number with its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentStatus {
    /// The number no longer resolves (removed from the union catalog).
    NotFound,
    /// The number is still current.
    Unchanged,
    /// The record was merged; carries the surviving control number.
    Merged(String),
}

/// Bucket key for validation-report aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorKey {
    pub level: String,
    pub tag: String,
    pub message: String,
}

impl std::fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.level, self.tag, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records without an identifier still have a printable display form.
    #[test]
    fn test_display_identifier_fallbacks() {
        let unit = WorkUnit::Record { bytes: vec![0x30], identifier: None };
        assert_eq!(unit.display_identifier(), "<no identifier>");

        let unit = WorkUnit::Batch { lines: vec![] };
        assert_eq!(unit.display_identifier(), "<empty batch>");

        let unit = WorkUnit::Batch { lines: vec!["123456".into(), "7890".into()] };
        assert_eq!(unit.display_identifier(), "123456");
    }

    /// Only auth errors and timeouts are transient.
    #[test]
    fn test_transient_categories() {
        assert!(OutcomeCategory::AuthError.is_transient());
        assert!(OutcomeCategory::Timeout.is_transient());
        assert!(!OutcomeCategory::RateLimited.is_transient());
        assert!(!OutcomeCategory::Success.is_transient());
        assert!(!OutcomeCategory::NotFound.is_transient());
        assert!(!OutcomeCategory::BadRequest.is_transient());
        assert!(!OutcomeCategory::Unknown.is_transient());
    }

    /// The report key renders in the pipe-separated report format.
    #[test]
    fn test_error_key_display() {
        let key = ErrorKey {
            level: "severe".into(),
            tag: "245".into(),
            message: "Invalid indicator".into(),
        };
        assert_eq!(key.to_string(), "severe|245|Invalid indicator");
    }
}
