//! Core types and schemas for quantumproof-ops.
//!
//! This module contains the sensitive input boundary, the fingerprinter and the
//! canonical `RunResult` schema (v1) produced by every verified run.

pub mod env;
pub mod input;
pub mod schema;

// Re-export key types for convenience
pub use env::EnvironmentInfo;
pub use input::{Fingerprint, SensitiveInput, fingerprint};
pub use schema::{
    BenchmarkMetrics, ComputeProvenance, ComputeResult, FheParameters, ProofArtifact, Rollout,
    RunResult, SCHEMA_VERSION,
};
