//! Canonical serialization for commitment hashing.
//!
//! `CanonicalBytes` is the only input accepted by the commitment hash. Its
//! constructor serializes through `serde_json::Value`, rejects non-integer
//! floats, and writes compact JSON with object keys sorted at every depth, so
//! two logically equal structures always produce the same byte string
//! regardless of field declaration or insertion order.

use serde::Serialize;
use serde_json::Value;

use crate::{OpsError, OpsResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    /// Returns `OpsError::Canonicalization` if the value contains a float that
    /// is not an integer, or if serialization fails.
    pub fn new(obj: &impl Serialize) -> OpsResult<Self> {
        let value = serde_json::to_value(obj)
            .map_err(|e| OpsError::Canonicalization(e.to_string()))?;
        let mut out = Vec::new();
        write_canonical(&value, &mut out)?;
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> OpsResult<()> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => write_scalar(value, out),
        Value::Number(n) => {
            if n.is_f64() {
                return Err(OpsError::Canonicalization(format!("float rejected: {n}")));
            }
            write_scalar(value, out)
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
            Ok(())
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push(b'{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, k)
                    .map_err(|e| OpsError::Canonicalization(e.to_string()))?;
                out.push(b':');
                write_canonical(v, out)?;
            }
            out.push(b'}');
            Ok(())
        }
    }
}

fn write_scalar(value: &Value, out: &mut Vec<u8>) -> OpsResult<()> {
    serde_json::to_writer(out, value).map_err(|e| OpsError::Canonicalization(e.to_string()))
}
