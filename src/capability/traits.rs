//! Capability traits and error types for homomorphic evaluation.

use std::fmt;

use thiserror::Error;

use crate::core::FheParameters;

/// Failure raised by a homomorphic capability. Always recoverable by the
/// compute strategy through the simulated fallback.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("homomorphic capability unavailable: {0}")]
    Unavailable(String),
    #[error("capability helper I/O failed: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("capability {op} failed: status={status} stderr={stderr}")]
    Failed {
        op: &'static str,
        status: String,
        stderr: String,
    },
    #[error("capability {op} timed out")]
    Timeout { op: &'static str },
    #[error("capability {op} returned malformed output: {detail}")]
    Malformed { op: &'static str, detail: String },
}

/// Opaque ciphertext handle. Only the capability that produced it can
/// interpret the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphertext(String);

impl Ciphertext {
    pub fn new(token: impl Into<String>) -> Self {
        Ciphertext(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} bytes)", self.0.len())
    }
}

/// An opened homomorphic evaluation context.
///
/// Implementations own their key material. Nothing mutable is shared between
/// two instances, so each run opens its own.
pub trait HomomorphicCapability {
    /// Returns the capability name (e.g., "external", "mock").
    fn name(&self) -> &str;

    /// Parameter metadata recorded in the proof artifact.
    fn parameters(&self) -> FheParameters;

    /// Encrypt a scalar.
    fn encrypt(&self, value: f64) -> Result<Ciphertext, CapabilityError>;

    /// Compute `scale * x + shift` on an encrypted `x`.
    fn affine_transform(
        &self,
        ciphertext: &Ciphertext,
        scale: f64,
        shift: f64,
    ) -> Result<Ciphertext, CapabilityError>;

    /// Decrypt a scalar.
    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<f64, CapabilityError>;
}

/// Factory for fresh capability instances.
pub trait CapabilityProvider: Send + Sync {
    /// Returns the provider name.
    fn name(&self) -> &str;

    /// Open a fresh capability instance (key generation happens here).
    fn open(&self) -> Result<Box<dyn HomomorphicCapability>, CapabilityError>;
}

/// Provider used when no homomorphic backend is configured.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableProvider {
            reason: reason.into(),
        }
    }
}

impl CapabilityProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn open(&self) -> Result<Box<dyn HomomorphicCapability>, CapabilityError> {
        Err(CapabilityError::Unavailable(self.reason.clone()))
    }
}
