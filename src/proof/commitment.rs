//! Deterministic hash commitment over the public values of a run.
//!
//! The commitment is `sha256("commitment::" + canonical(statement))`. There is
//! no nonce, so anyone holding the fingerprint, compute result, scenario and
//! circuit version can re-derive it. It offers binding, not hiding, and is not
//! a zero-knowledge proof.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::canonical::CanonicalBytes;
use crate::core::{ComputeResult, Fingerprint};
use crate::{OpsResult, sha256_hex};

pub const COMMITMENT_SCHEME: &str = "sha256-canonical-json";
const COMMITMENT_DOMAIN: &str = "commitment::";
const STATEMENT_KIND: &str = "hash-commitment";
const STATEMENT_CLAIM: &str = "computation_correctness";
const SECURITY_PARAMETER: u32 = 128;

#[derive(Debug, Clone, Serialize)]
struct PublicInputs<'a> {
    input_fingerprint: &'a Fingerprint,
    compute_result: &'a ComputeResult,
    scenario: &'a str,
}

/// The statement a commitment binds.
#[derive(Debug, Clone, Serialize)]
pub struct ProofStatement<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    claim: &'static str,
    public_inputs: PublicInputs<'a>,
    circuit_version: &'a str,
    commitment_scheme: &'static str,
    security_parameter: u32,
}

impl<'a> ProofStatement<'a> {
    pub fn new(
        fingerprint: &'a Fingerprint,
        compute_result: &'a ComputeResult,
        scenario: &'a str,
        circuit_version: &'a str,
    ) -> Self {
        ProofStatement {
            kind: STATEMENT_KIND,
            claim: STATEMENT_CLAIM,
            public_inputs: PublicInputs {
                input_fingerprint: fingerprint,
                compute_result,
                scenario,
            },
            circuit_version,
            commitment_scheme: COMMITMENT_SCHEME,
            security_parameter: SECURITY_PARAMETER,
        }
    }

    pub fn circuit_version(&self) -> &str {
        self.circuit_version
    }

    /// Canonical bytes of this statement.
    pub fn canonical_bytes(&self) -> OpsResult<CanonicalBytes> {
        CanonicalBytes::new(self)
    }
}

/// Hex commitment digest (the "proof hash").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(String);

impl Commitment {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Commitment(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seam for the orchestrator: how a statement becomes a commitment.
pub trait CommitmentScheme: Send + Sync {
    /// Returns the scheme name.
    fn name(&self) -> &str;

    /// Commit to a statement.
    fn commit(&self, statement: &ProofStatement<'_>) -> OpsResult<Commitment>;
}

/// SHA-256 over canonical JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCommitment;

impl CommitmentScheme for HashCommitment {
    fn name(&self) -> &str {
        COMMITMENT_SCHEME
    }

    fn commit(&self, statement: &ProofStatement<'_>) -> OpsResult<Commitment> {
        let canonical = statement.canonical_bytes()?;
        let mut payload = Vec::with_capacity(COMMITMENT_DOMAIN.len() + canonical.len());
        payload.extend_from_slice(COMMITMENT_DOMAIN.as_bytes());
        payload.extend_from_slice(canonical.as_bytes());
        Ok(Commitment(sha256_hex(&payload)))
    }
}

/// Commit to the public values of a run.
pub fn commit(
    fingerprint: &Fingerprint,
    compute_result: &ComputeResult,
    scenario: &str,
    circuit_version: &str,
) -> OpsResult<Commitment> {
    HashCommitment.commit(&ProofStatement::new(
        fingerprint,
        compute_result,
        scenario,
        circuit_version,
    ))
}

/// Re-derive the commitment and compare for exact equality.
///
/// A statement that cannot be canonicalized never verifies.
pub fn verify(
    commitment: &Commitment,
    fingerprint: &Fingerprint,
    compute_result: &ComputeResult,
    scenario: &str,
    circuit_version: &str,
) -> bool {
    match commit(fingerprint, compute_result, scenario, circuit_version) {
        Ok(expected) => expected == *commitment,
        Err(e) => {
            debug!(error = %e, "commitment could not be re-derived");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComputeProvenance, Rollout, SensitiveInput, fingerprint};
    use proptest::prelude::*;

    fn sample_result() -> ComputeResult {
        ComputeResult {
            risk_reduction_percent: 54,
            performance_overhead_percent: 7,
            recommended_rollout: Rollout::Phased,
            fhe_enabled: false,
            provenance: ComputeProvenance::Simulated,
        }
    }

    fn sample_fp() -> Fingerprint {
        fingerprint(&SensitiveInput::new("demo-sensitive"))
    }

    #[test]
    fn test_commit_is_deterministic() {
        let a = commit(&sample_fp(), &sample_result(), "test-scenario", "fhe-seal-v1").unwrap();
        let b = commit(&sample_fp(), &sample_result(), "test-scenario", "fhe-seal-v1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_verify_roundtrip() {
        let c = commit(&sample_fp(), &sample_result(), "s", "v1").unwrap();
        assert!(verify(&c, &sample_fp(), &sample_result(), "s", "v1"));
    }

    #[test]
    fn test_each_field_is_bound() {
        let fp = sample_fp();
        let result = sample_result();
        let base = commit(&fp, &result, "s", "v1").unwrap();

        let other_fp = fingerprint(&SensitiveInput::new("other"));
        assert!(!verify(&base, &other_fp, &result, "s", "v1"));

        let mut other_result = result.clone();
        other_result.risk_reduction_percent += 1;
        assert!(!verify(&base, &fp, &other_result, "s", "v1"));

        let mut relabeled = result.clone();
        relabeled.provenance = ComputeProvenance::Degraded {
            reason: "x".into(),
        };
        assert!(!verify(&base, &fp, &relabeled, "s", "v1"));

        assert!(!verify(&base, &fp, &result, "s2", "v1"));
        assert!(!verify(&base, &fp, &result, "s", "v2"));
    }

    #[test]
    fn test_statement_layout() {
        let fp = sample_fp();
        let result = sample_result();
        let statement = ProofStatement::new(&fp, &result, "s", "v1");
        let text = String::from_utf8(statement.canonical_bytes().unwrap().as_bytes().to_vec())
            .unwrap();
        assert!(text.starts_with(r#"{"circuit_version":"v1","claim":"computation_correctness""#));
        assert!(text.contains(r#""type":"hash-commitment""#));
        assert!(text.contains(fp.as_str()));
        assert_eq!(statement.circuit_version(), "v1");
    }

    #[test]
    fn test_commitment_differs_from_fingerprint() {
        let c = commit(&sample_fp(), &sample_result(), "s", "v1").unwrap();
        assert_ne!(c.as_str(), sample_fp().as_str());
    }

    proptest! {
        #[test]
        fn scenario_change_breaks_commitment(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
            prop_assume!(a != b);
            let c = commit(&sample_fp(), &sample_result(), &a, "v1").unwrap();
            prop_assert!(verify(&c, &sample_fp(), &sample_result(), &a, "v1"));
            prop_assert!(!verify(&c, &sample_fp(), &sample_result(), &b, "v1"));
        }

        #[test]
        fn circuit_version_change_breaks_commitment(v in "[a-z0-9.-]{1,16}") {
            prop_assume!(v != "fhe-seal-v1");
            let base = commit(&sample_fp(), &sample_result(), "s", "fhe-seal-v1").unwrap();
            let other = commit(&sample_fp(), &sample_result(), "s", &v).unwrap();
            prop_assert_ne!(base, other);
        }
    }
}
