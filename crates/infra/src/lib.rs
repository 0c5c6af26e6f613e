//! # Bibops Infrastructure
//!
//! Everything impure: HTTP, filesystem sinks, environment configuration.
//!
//! This crate contains:
//! - The metadata service request dispatcher and its retry state machine
//! - Operation specs (method, path, headers, scopes per API operation)
//! - The shared run loop (enumerate, dispatch, classify, sink)
//! - Timestamped per-category output files
//! - Credential and endpoint loading from the environment
//!
//! ## Architecture
//! - Depends on `bibops-common`, `bibops-core`, and `bibops-domain`
//! - The front ends in `bibops-cli` only ever touch this crate's
//!   public surface

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod sink;

pub use api::dispatcher::{Dispatch, DispatchResult, Dispatcher, GiveUpReason};
pub use api::operations::{prepare, OperationKind, PreparedRequest};
pub use api::runner::{run_units, OutcomeSink, RunSummary};
pub use errors::InfraError;
pub use http::build_http_client;
pub use sink::{suffix, OutputSet, RunPaths};
