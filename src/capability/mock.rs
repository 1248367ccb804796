//! Mock capability for testing.

use super::traits::{CapabilityError, CapabilityProvider, Ciphertext, HomomorphicCapability};
use crate::core::FheParameters;

/// Capability operation at which a mock can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Open,
    Encrypt,
    Transform,
    Decrypt,
}

/// Configuration for mock capability responses.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Name to report
    pub name: String,
    /// Parameters to report
    pub parameters: FheParameters,
    /// Operation that should fail, if any
    pub fails_at: Option<MockFailure>,
    /// Override for the decrypted value
    pub decrypt_output: Option<f64>,
}

impl MockConfig {
    /// Create a new mock config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        MockConfig {
            name: name.into(),
            parameters: FheParameters {
                enabled: true,
                scheme: Some("MOCK".to_string()),
                poly_modulus_degree: Some(1024),
                coeff_mod_bit_sizes: None,
                global_scale_bits: None,
                security_level: Some("none".to_string()),
                library: Some("mock".to_string()),
            },
            fails_at: None,
            decrypt_output: None,
        }
    }

    /// Make the given operation fail.
    pub fn fails_at(mut self, op: MockFailure) -> Self {
        self.fails_at = Some(op);
        self
    }

    /// Force decrypt to return this value regardless of the ciphertext.
    pub fn with_decrypt_output(mut self, value: f64) -> Self {
        self.decrypt_output = Some(value);
        self
    }
}

/// In-process mock: ciphertexts carry the plaintext value, so results match
/// an exact evaluation of the transform.
#[derive(Debug, Clone)]
pub struct MockCapability {
    config: MockConfig,
}

impl MockCapability {
    pub fn new(config: MockConfig) -> Self {
        MockCapability { config }
    }

    fn check(&self, op: MockFailure, label: &'static str) -> Result<(), CapabilityError> {
        if self.config.fails_at == Some(op) {
            return Err(CapabilityError::Failed {
                op: label,
                status: "mock".into(),
                stderr: format!("mock {label} failed"),
            });
        }
        Ok(())
    }

    fn parse(ciphertext: &Ciphertext, op: &'static str) -> Result<f64, CapabilityError> {
        ciphertext
            .token()
            .strip_prefix("mock:")
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| CapabilityError::Malformed {
                op,
                detail: "not a mock ciphertext".into(),
            })
    }
}

impl HomomorphicCapability for MockCapability {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn parameters(&self) -> FheParameters {
        self.config.parameters.clone()
    }

    fn encrypt(&self, value: f64) -> Result<Ciphertext, CapabilityError> {
        self.check(MockFailure::Encrypt, "encrypt")?;
        Ok(Ciphertext::new(format!("mock:{value}")))
    }

    fn affine_transform(
        &self,
        ciphertext: &Ciphertext,
        scale: f64,
        shift: f64,
    ) -> Result<Ciphertext, CapabilityError> {
        self.check(MockFailure::Transform, "affine")?;
        let x = Self::parse(ciphertext, "affine")?;
        Ok(Ciphertext::new(format!("mock:{}", scale * x + shift)))
    }

    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<f64, CapabilityError> {
        self.check(MockFailure::Decrypt, "decrypt")?;
        let x = Self::parse(ciphertext, "decrypt")?;
        Ok(self.config.decrypt_output.unwrap_or(x))
    }
}

/// Provider handing out fresh `MockCapability` instances.
#[derive(Debug, Clone)]
pub struct MockProvider {
    config: MockConfig,
}

impl MockProvider {
    pub fn new(config: MockConfig) -> Self {
        MockProvider { config }
    }

    /// Create a mock provider with default configuration.
    pub fn default_mock() -> Self {
        Self::new(MockConfig::new("mock"))
    }
}

impl CapabilityProvider for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn open(&self) -> Result<Box<dyn HomomorphicCapability>, CapabilityError> {
        if self.config.fails_at == Some(MockFailure::Open) {
            return Err(CapabilityError::Unavailable("mock open failed".into()));
        }
        Ok(Box::new(MockCapability::new(self.config.clone())))
    }
}
