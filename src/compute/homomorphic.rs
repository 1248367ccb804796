//! Homomorphic computation through an injected capability provider.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use super::{ComputeMode, ComputeOutcome, ComputeStrategy, SimulatedStrategy};
use crate::capability::{CapabilityError, CapabilityProvider};
use crate::core::{ComputeProvenance, ComputeResult, FheParameters, Rollout, SensitiveInput};
use crate::{hex_window, sha256_hex};

/// Reported overhead of the real computation relative to the simulated
/// baseline, in percent.
pub const DEFAULT_OVERHEAD_PERCENT: u32 = 5000;

/// Inputs are mapped onto `[DOMAIN_MIN, DOMAIN_MIN + DOMAIN_SPAN - 1]`.
const DOMAIN_MIN: u32 = 300;
const DOMAIN_SPAN: u32 = 551;

/// `(x - 300) * 100 / 550` expressed as `scale * x + shift`.
const SCALE: f64 = 100.0 / 550.0;
const SHIFT: f64 = -(DOMAIN_MIN as f64) * SCALE;

struct Evaluation {
    score: u32,
    encryption_time_ms: u128,
    computation_time_ms: u128,
    parameters: FheParameters,
}

pub struct HomomorphicStrategy {
    provider: Arc<dyn CapabilityProvider>,
    overhead_percent: u32,
}

impl HomomorphicStrategy {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        HomomorphicStrategy {
            provider,
            overhead_percent: DEFAULT_OVERHEAD_PERCENT,
        }
    }

    /// Set the reported overhead.
    pub fn with_overhead_percent(mut self, overhead_percent: u32) -> Self {
        self.overhead_percent = overhead_percent;
        self
    }

    /// Map a sensitive input onto the capability's numeric domain.
    pub fn domain_value(input: &SensitiveInput) -> u32 {
        let digest = sha256_hex(input.expose().as_bytes());
        hex_window(&digest, 0) % DOMAIN_SPAN + DOMAIN_MIN
    }

    fn evaluate(&self, input: &SensitiveInput) -> Result<Evaluation, CapabilityError> {
        let value = Self::domain_value(input);

        let enc_start = Instant::now();
        let capability = self.provider.open()?;
        let ciphertext = capability.encrypt(value as f64)?;
        let encryption_time_ms = enc_start.elapsed().as_millis();

        let comp_start = Instant::now();
        let transformed = capability.affine_transform(&ciphertext, SCALE, SHIFT)?;
        let decrypted = capability.decrypt(&transformed)?;
        let computation_time_ms = comp_start.elapsed().as_millis();

        if !decrypted.is_finite() {
            return Err(CapabilityError::Malformed {
                op: "decrypt",
                detail: format!("non-finite scalar {decrypted}"),
            });
        }
        let score = decrypted.clamp(0.0, 100.0).floor() as u32;
        debug!(
            capability = capability.name(),
            encryption_time_ms = encryption_time_ms as u64,
            computation_time_ms = computation_time_ms as u64,
            "homomorphic evaluation complete"
        );

        Ok(Evaluation {
            score,
            encryption_time_ms,
            computation_time_ms,
            parameters: capability.parameters(),
        })
    }
}

impl ComputeStrategy for HomomorphicStrategy {
    fn name(&self) -> &str {
        "homomorphic"
    }

    fn compute(&self, input: &SensitiveInput, scenario: &str) -> ComputeOutcome {
        match self.evaluate(input) {
            Ok(eval) => {
                let scheme = eval
                    .parameters
                    .scheme
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                ComputeOutcome {
                    result: ComputeResult {
                        risk_reduction_percent: eval.score,
                        performance_overhead_percent: self.overhead_percent,
                        recommended_rollout: Rollout::recommend(eval.score, self.overhead_percent),
                        fhe_enabled: true,
                        provenance: ComputeProvenance::Homomorphic { scheme },
                    },
                    mode: ComputeMode::Homomorphic,
                    encryption_time_ms: eval.encryption_time_ms,
                    computation_time_ms: eval.computation_time_ms,
                    fhe_parameters: eval.parameters,
                }
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "homomorphic evaluation failed, falling back to simulated compute"
                );
                let provenance = ComputeProvenance::Degraded {
                    reason: e.to_string(),
                };
                ComputeOutcome {
                    result: SimulatedStrategy::derive(input, scenario, provenance),
                    mode: ComputeMode::Degraded,
                    encryption_time_ms: 0,
                    computation_time_ms: 0,
                    fhe_parameters: FheParameters::disabled(),
                }
            }
        }
    }
}
