//! # Bibops Core
//!
//! Pure batch-processing logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - MARC21 stream splitting and identifier extraction
//! - Control-number batching and lookup-response mapping
//! - Response classification
//! - Validation-report aggregation
//! - Lookup XML input conversion
//!
//! ## Architecture Principles
//! - Only depends on `bibops-domain`
//! - No HTTP, filesystem, or clock code
//! - Everything here is deterministic and testable without a network

pub mod batch;
pub mod classify;
pub mod records;
pub mod report;
pub mod xmlinput;

pub use batch::{map_batch, parse_line, to_batches, LineStatus, OcnLine};
pub use classify::classify;
pub use records::{IdentifierRule, RecordSource};
pub use report::{aggregate, parse_collection, ValidationEnvelope, ValidationReport};
pub use xmlinput::lookup_lines_from_xml;
