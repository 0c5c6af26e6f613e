//! Metadata service API layer
//!
//! Operation specs, the retrying dispatcher, and the shared run loop.

pub mod dispatcher;
pub mod operations;
pub mod runner;
