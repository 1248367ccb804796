//! Deterministic simulated computation.

use zeroize::Zeroizing;

use super::{ComputeMode, ComputeOutcome, ComputeStrategy};
use crate::core::{ComputeProvenance, ComputeResult, FheParameters, Rollout, SensitiveInput};
use crate::{hex_window, sha256_hex};

/// Risk reduction lies in `[RISK_BASE, RISK_BASE + RISK_SPAN - 1]`.
const RISK_BASE: u32 = 20;
const RISK_SPAN: u32 = 61;
/// Overhead lies in `[OVERHEAD_BASE, OVERHEAD_BASE + OVERHEAD_SPAN - 1]`.
const OVERHEAD_BASE: u32 = 2;
const OVERHEAD_SPAN: u32 = 19;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedStrategy;

impl SimulatedStrategy {
    /// Derive a result from `sha256(input + scenario)`.
    pub fn derive(
        input: &SensitiveInput,
        scenario: &str,
        provenance: ComputeProvenance,
    ) -> ComputeResult {
        let mut payload = Zeroizing::new(String::with_capacity(input.len() + scenario.len()));
        payload.push_str(input.expose());
        payload.push_str(scenario);
        let digest = sha256_hex(payload.as_bytes());

        let signal = hex_window(&digest, 0) % 100;
        let risk_reduction_percent = RISK_BASE + signal % RISK_SPAN;
        let performance_overhead_percent = OVERHEAD_BASE + hex_window(&digest, 8) % OVERHEAD_SPAN;

        ComputeResult {
            risk_reduction_percent,
            performance_overhead_percent,
            recommended_rollout: Rollout::recommend(
                risk_reduction_percent,
                performance_overhead_percent,
            ),
            fhe_enabled: false,
            provenance,
        }
    }
}

impl ComputeStrategy for SimulatedStrategy {
    fn name(&self) -> &str {
        "simulated"
    }

    fn compute(&self, input: &SensitiveInput, scenario: &str) -> ComputeOutcome {
        ComputeOutcome {
            result: Self::derive(input, scenario, ComputeProvenance::Simulated),
            mode: ComputeMode::Simulated,
            encryption_time_ms: 0,
            computation_time_ms: 0,
            fhe_parameters: FheParameters::disabled(),
        }
    }
}
