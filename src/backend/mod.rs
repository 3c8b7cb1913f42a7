//! Evaluation backend access
//!
//! The backend is an external HTTP service; this module owns its wire types
//! and the client used to reach it.

mod client;
mod types;

#[cfg(test)]
pub mod mock;

pub use client::{BackendTimeouts, EvaluationBackend, HttpBackend};
pub use types::{BackendStatus, EvaluationResult, RequestMetadata};
