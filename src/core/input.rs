//! Sensitive input boundary and the fingerprinter.

use std::ffi::OsString;
use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{OpsError, OpsResult, sha256_hex};

const FINGERPRINT_DOMAIN: &str = "fingerprint::";

/// A sensitive value that lives only in memory for the duration of one run.
///
/// The backing buffer is wiped on drop and `Debug` never prints the content.
/// There is intentionally no `Serialize` impl.
#[derive(Clone)]
pub struct SensitiveInput(Zeroizing<String>);

impl SensitiveInput {
    pub fn new(value: impl Into<String>) -> Self {
        SensitiveInput(Zeroizing::new(value.into()))
    }

    /// Build from raw bytes, rejecting anything that is not valid UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> OpsResult<Self> {
        match String::from_utf8(bytes) {
            Ok(s) => Ok(Self::new(s)),
            Err(e) => {
                let valid_up_to = e.utf8_error().valid_up_to();
                // wipe the rejected buffer too
                drop(Zeroizing::new(e.into_bytes()));
                Err(OpsError::InvalidInput(format!(
                    "sensitive input is not valid UTF-8 (invalid byte at offset {valid_up_to})"
                )))
            }
        }
    }

    /// Build from a command-line argument.
    pub fn from_os_string(value: OsString) -> OpsResult<Self> {
        value
            .into_string()
            .map(Self::new)
            .map_err(|_| OpsError::InvalidInput("sensitive input is not valid unicode".into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveInput(<redacted, {} bytes>)", self.0.len())
    }
}

/// Opaque, one-way identifier of a sensitive input (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Fingerprint(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a sensitive input as `sha256("fingerprint::" + input)`.
pub fn fingerprint(input: &SensitiveInput) -> Fingerprint {
    let mut payload = Zeroizing::new(String::with_capacity(FINGERPRINT_DOMAIN.len() + input.len()));
    payload.push_str(FINGERPRINT_DOMAIN);
    payload.push_str(input.expose());
    Fingerprint(sha256_hex(payload.as_bytes()))
}
