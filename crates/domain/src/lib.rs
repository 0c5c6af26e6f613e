//! # bibops Domain
//!
//! Data types and models shared across the bibops workspace.
//!
//! This crate contains:
//! - Work units and classified outcomes
//! - Wire constants (MARC21 separators, known API failure markers)
//! - Configuration structures
//! - The workspace error type and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other bibops crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::{ApiConfig, Credential, RetrySettings};
pub use errors::{BibopsError, Result};
pub use types::{CurrentStatus, ErrorKey, Outcome, OutcomeCategory, WorkUnit};
