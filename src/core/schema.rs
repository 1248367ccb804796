//! RunResult schema v1 - canonical record for every verified pipeline run.

use serde::{Deserialize, Serialize};

use super::env::EnvironmentInfo;

/// Schema version for forward compatibility
pub const SCHEMA_VERSION: u32 = 1;

/// Rollout recommendation derived from the computed risk reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollout {
    Pilot,
    Phased,
    Accelerated,
}

impl Rollout {
    /// Classify a (risk reduction, overhead) pair.
    pub fn recommend(risk_reduction_percent: u32, overhead_percent: u32) -> Self {
        if risk_reduction_percent >= 60 && overhead_percent <= 10 {
            Rollout::Accelerated
        } else if risk_reduction_percent < 35 {
            Rollout::Pilot
        } else {
            Rollout::Phased
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rollout::Pilot => "pilot",
            Rollout::Phased => "phased",
            Rollout::Accelerated => "accelerated",
        }
    }
}

/// Which compute path produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputeProvenance {
    /// Simulated arithmetic was selected up front.
    Simulated,
    /// The external homomorphic capability evaluated the transform.
    Homomorphic { scheme: String },
    /// The homomorphic path failed and the simulated path substituted for it.
    Degraded { reason: String },
}

/// Result of one computation. Integer-only so it always canonicalizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResult {
    pub risk_reduction_percent: u32,
    pub performance_overhead_percent: u32,
    pub recommended_rollout: Rollout,
    pub fhe_enabled: bool,
    pub provenance: ComputeProvenance,
}

impl ComputeResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.provenance, ComputeProvenance::Degraded { .. })
    }
}

/// FHE parameter metadata reported in the proof artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FheParameters {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly_modulus_degree: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coeff_mod_bit_sizes: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_scale_bits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

impl FheParameters {
    pub fn disabled() -> Self {
        FheParameters {
            enabled: false,
            scheme: None,
            poly_modulus_degree: None,
            coeff_mod_bit_sizes: None,
            global_scale_bits: None,
            security_level: None,
            library: None,
        }
    }
}

/// Per-stage timings in milliseconds. Observational only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub runtime_ms: u128,
    pub compute_mode: String,
    pub fingerprint_time_ms: u128,
    pub encryption_time_ms: u128,
    pub computation_time_ms: u128,
    pub proof_time_ms: u128,
    pub verify_time_ms: u128,
}

/// The commitment ("proof") and the public values it binds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub proof_hash: String,
    pub verification_result: bool,
    pub circuit_version: String,
    pub input_fingerprint: String,
    pub crypto_primitives_used: Vec<String>,
    pub fhe_parameters: FheParameters,
}

/// Canonical run record - the unified output schema for exporters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// Non-reproducible identifier for this run
    pub run_id: String,

    /// ISO 8601 timestamp
    pub timestamp_utc: String,

    pub app_version: String,

    pub scenario: String,

    pub compute_result: ComputeResult,

    pub risk_context: String,

    pub trust_model_comparison: String,

    pub benchmark: BenchmarkMetrics,

    pub proof: ProofArtifact,

    /// Host information for the audit trail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollout_rules() {
        assert_eq!(Rollout::recommend(80, 2), Rollout::Accelerated);
        assert_eq!(Rollout::recommend(60, 10), Rollout::Accelerated);
        assert_eq!(Rollout::recommend(60, 11), Rollout::Phased);
        assert_eq!(Rollout::recommend(54, 7), Rollout::Phased);
        assert_eq!(Rollout::recommend(34, 2), Rollout::Pilot);
        assert_eq!(Rollout::recommend(90, 5000), Rollout::Phased);
    }

    #[test]
    fn test_provenance_is_tagged() {
        let v = serde_json::to_value(ComputeProvenance::Degraded {
            reason: "boom".into(),
        })
        .unwrap();
        assert_eq!(v["kind"], "degraded");
        assert_eq!(v["reason"], "boom");

        let v = serde_json::to_value(ComputeProvenance::Simulated).unwrap();
        assert_eq!(v, serde_json::json!({ "kind": "simulated" }));
    }

    #[test]
    fn test_disabled_fhe_parameters_serialize_compactly() {
        let v = serde_json::to_value(FheParameters::disabled()).unwrap();
        assert_eq!(v, serde_json::json!({ "enabled": false }));
    }

    #[test]
    fn test_compute_result_field_names() {
        let result = ComputeResult {
            risk_reduction_percent: 54,
            performance_overhead_percent: 7,
            recommended_rollout: Rollout::Phased,
            fhe_enabled: false,
            provenance: ComputeProvenance::Simulated,
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["risk_reduction_percent"], 54);
        assert_eq!(v["performance_overhead_percent"], 7);
        assert_eq!(v["recommended_rollout"], "phased");
        assert_eq!(v["fhe_enabled"], false);
        assert!(!result.is_degraded());
    }
}
