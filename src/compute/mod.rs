//! Compute strategies: simulated arithmetic or homomorphic evaluation.

pub mod homomorphic;
pub mod simulated;

use serde::{Deserialize, Serialize};

use crate::core::{ComputeResult, FheParameters, SensitiveInput};

pub use homomorphic::{DEFAULT_OVERHEAD_PERCENT, HomomorphicStrategy};
pub use simulated::SimulatedStrategy;

/// Label describing how a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeMode {
    #[serde(rename = "simulated-forced")]
    Simulated,
    #[serde(rename = "fhe-homomorphic-encryption")]
    Homomorphic,
    #[serde(rename = "fallback-capability-error")]
    Degraded,
}

impl ComputeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeMode::Simulated => "simulated-forced",
            ComputeMode::Homomorphic => "fhe-homomorphic-encryption",
            ComputeMode::Degraded => "fallback-capability-error",
        }
    }
}

/// Everything a strategy reports for one computation.
#[derive(Debug, Clone)]
pub struct ComputeOutcome {
    pub result: ComputeResult,
    pub mode: ComputeMode,
    pub encryption_time_ms: u128,
    pub computation_time_ms: u128,
    pub fhe_parameters: FheParameters,
}

/// A pluggable computation over a sensitive input.
///
/// Strategies never fail: the homomorphic one recovers from capability errors
/// by substituting the simulated result and marking it degraded.
pub trait ComputeStrategy: Send + Sync {
    /// Returns the strategy name (e.g., "simulated", "homomorphic").
    fn name(&self) -> &str;

    fn compute(&self, input: &SensitiveInput, scenario: &str) -> ComputeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels_match_serde() {
        for mode in [
            ComputeMode::Simulated,
            ComputeMode::Homomorphic,
            ComputeMode::Degraded,
        ] {
            let v = serde_json::to_value(mode).unwrap();
            assert_eq!(v, mode.as_str());
        }
    }
}
