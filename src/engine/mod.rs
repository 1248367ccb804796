//! Engine module: orchestrates compute strategies, commitments and the
//! verification gate.
//!
//! # Boundaries
//!
//! - `compute` does NOT know about commitments; it only produces results.
//! - `proof` does NOT know how a result was computed.
//! - `pipeline` sequences both and is the only producer of `RunResult`.

pub mod pipeline;

// Re-export key types for convenience
pub use pipeline::{Pipeline, RunRequest};
