//! Homomorphic-computation capability abstraction.
//!
//! The pipeline treats the FHE library as an opaque capability: encrypt a
//! scalar, apply an affine transform to the ciphertext, decrypt a scalar.
//! `CapabilityProvider` hands out a fresh instance per run.

pub mod external;
pub mod mock;
pub mod traits;

// Re-export key types
pub use external::{ExternalCapability, ExternalConfig, ExternalProvider};
pub use mock::{MockCapability, MockConfig, MockFailure, MockProvider};
pub use traits::{
    CapabilityError, CapabilityProvider, Ciphertext, HomomorphicCapability, UnavailableProvider,
};
