pub mod capability;
pub mod compute;
pub mod config;
pub mod core;
pub mod engine;
pub mod proof;
pub mod report;
pub mod storage;

pub mod run_cmd;
pub mod verify_cmd;

use thiserror::Error;

pub use capability::CapabilityError;

/// Application version stamped into every run record.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Circuit (computation + commitment scheme) version used when the
/// configuration does not override it.
pub const DEFAULT_CIRCUIT_VERSION: &str = "fhe-seal-v1";

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("proof verification failed: expected {expected}, got {actual}")]
    VerificationFailed { expected: String, actual: String },
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type OpsResult<T> = Result<T, OpsError>;

// Shared helpers
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha256::digest;
    digest(bytes)
}

/// First eight hex digits of `hex` starting at `offset`, as an integer.
pub(crate) fn hex_window(hex: &str, offset: usize) -> u32 {
    hex.get(offset..offset + 8)
        .and_then(|w| u32::from_str_radix(w, 16).ok())
        .unwrap_or(0)
}

pub fn now_string() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".to_string())
}
