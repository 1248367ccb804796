//! Storage layer for verified run records.
//!
//! This module provides persistence for `RunResult` data: one JSON document
//! per run and an append-only JSONL audit log.

pub mod json;
pub mod jsonl;

// Re-export key types
pub use json::{export_json, read_json};
pub use jsonl::HistoryLog;
