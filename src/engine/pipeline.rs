//! Run orchestration for the commit-compute-verify pipeline.
//!
//! This module sequences fingerprinting, the selected `ComputeStrategy`, the
//! commitment and the `VerificationGate`, measuring every stage. A `RunResult`
//! is only assembled from a `VerifiedCommitment`; a rejected run returns
//! `OpsError::VerificationFailed` and produces nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::capability::{CapabilityProvider, ExternalConfig, ExternalProvider, UnavailableProvider};
use crate::compute::{
    ComputeMode, ComputeOutcome, ComputeStrategy, HomomorphicStrategy, SimulatedStrategy,
};
use crate::config::{FHE_COMMAND_ENV, PipelineConfig};
use crate::core::{
    BenchmarkMetrics, EnvironmentInfo, Fingerprint, ProofArtifact, RunResult, SCHEMA_VERSION,
    SensitiveInput, fingerprint,
};
use crate::proof::{
    CommitmentScheme, HashCommitment, ProofStatement, VerificationGate, VerifiedCommitment,
};
use crate::{APP_VERSION, OpsResult, now_string, sha256_hex};

const TRUST_MODEL_COMPARISON: &str = "Cryptographic verification vs traditional trust";

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: SensitiveInput,
    pub scenario: String,
    pub force_fallback: bool,
}

impl RunRequest {
    pub fn new(input: SensitiveInput, scenario: impl Into<String>) -> Self {
        RunRequest {
            input,
            scenario: scenario.into(),
            force_fallback: false,
        }
    }

    /// Select the simulated strategy for this run.
    pub fn with_fallback(mut self, force_fallback: bool) -> Self {
        self.force_fallback = force_fallback;
        self
    }
}

/// A configured pipeline. Holds no per-run state and can be shared across
/// threads.
pub struct Pipeline {
    circuit_version: String,
    simulated: SimulatedStrategy,
    homomorphic: HomomorphicStrategy,
    scheme: Box<dyn CommitmentScheme>,
    record_environment: bool,
}

impl Pipeline {
    pub fn new(circuit_version: impl Into<String>, provider: Arc<dyn CapabilityProvider>) -> Self {
        Pipeline {
            circuit_version: circuit_version.into(),
            simulated: SimulatedStrategy,
            homomorphic: HomomorphicStrategy::new(provider),
            scheme: Box::new(HashCommitment),
            record_environment: true,
        }
    }

    /// Build from configuration: an external helper when `fhe.command` is
    /// set, otherwise an unavailable capability.
    pub fn from_config(config: &PipelineConfig) -> OpsResult<Self> {
        config.validate()?;
        let provider: Arc<dyn CapabilityProvider> = match config.fhe.command.as_deref() {
            Some(cmd) => {
                let external = ExternalConfig::from_command_line(cmd, config.fhe.parameters())?
                    .with_timeout(Duration::from_secs(config.fhe.timeout_secs));
                Arc::new(ExternalProvider::new(external))
            }
            None => Arc::new(UnavailableProvider::new(format!(
                "no FHE helper configured (set fhe.command or {FHE_COMMAND_ENV})"
            ))),
        };
        let pipeline = Pipeline::new(config.circuit_version.clone(), provider);
        Ok(pipeline.with_overhead_percent(config.fhe.overhead_percent))
    }

    /// Replace the commitment scheme.
    pub fn with_scheme(mut self, scheme: Box<dyn CommitmentScheme>) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set the overhead reported by the homomorphic strategy.
    pub fn with_overhead_percent(mut self, overhead_percent: u32) -> Self {
        self.homomorphic = self.homomorphic.with_overhead_percent(overhead_percent);
        self
    }

    /// Toggle host environment detection in run records.
    pub fn with_environment(mut self, record_environment: bool) -> Self {
        self.record_environment = record_environment;
        self
    }

    pub fn circuit_version(&self) -> &str {
        &self.circuit_version
    }

    fn select(&self, force_fallback: bool) -> &dyn ComputeStrategy {
        if force_fallback {
            &self.simulated
        } else {
            &self.homomorphic
        }
    }

    /// Execute one run.
    ///
    /// # Errors
    /// - `VerificationFailed` if the re-derived commitment does not match
    /// - `Canonicalization` if the statement cannot be serialized
    pub fn run(&self, request: &RunRequest) -> OpsResult<RunResult> {
        let total_start = Instant::now();
        let strategy = self.select(request.force_fallback);
        info!(
            scenario = %request.scenario,
            strategy = strategy.name(),
            circuit_version = %self.circuit_version,
            "starting run"
        );

        // Step 1: fingerprint
        let start = Instant::now();
        let input_fingerprint = fingerprint(&request.input);
        let fingerprint_time_ms = start.elapsed().as_millis();
        debug!(fingerprint = %input_fingerprint, "input fingerprinted");

        // Step 2: compute
        let outcome = strategy.compute(&request.input, &request.scenario);
        debug!(mode = outcome.mode.as_str(), "compute finished");

        // Step 3: commit
        let start = Instant::now();
        let statement = ProofStatement::new(
            &input_fingerprint,
            &outcome.result,
            &request.scenario,
            &self.circuit_version,
        );
        let commitment = self.scheme.commit(&statement)?;
        let proof_time_ms = start.elapsed().as_millis();

        // Step 4: verify; a rejection returns here
        let start = Instant::now();
        let mut gate = VerificationGate::new(commitment);
        let verified = gate.check(self.scheme.as_ref(), &statement)?;
        let verify_time_ms = start.elapsed().as_millis();

        let benchmark = BenchmarkMetrics {
            runtime_ms: total_start.elapsed().as_millis(),
            compute_mode: outcome.mode.as_str().to_string(),
            fingerprint_time_ms,
            encryption_time_ms: outcome.encryption_time_ms,
            computation_time_ms: outcome.computation_time_ms,
            proof_time_ms,
            verify_time_ms,
        };

        let result = self.assemble(
            verified,
            input_fingerprint,
            outcome,
            &request.scenario,
            benchmark,
        );
        info!(
            run_id = %result.run_id,
            mode = %result.benchmark.compute_mode,
            runtime_ms = result.benchmark.runtime_ms as u64,
            "run verified"
        );
        Ok(result)
    }

    fn assemble(
        &self,
        verified: VerifiedCommitment,
        input_fingerprint: Fingerprint,
        outcome: ComputeOutcome,
        scenario: &str,
        benchmark: BenchmarkMetrics,
    ) -> RunResult {
        let homomorphic = outcome.mode == ComputeMode::Homomorphic;
        let mut crypto_primitives_used = Vec::new();
        if homomorphic {
            crypto_primitives_used.push(format!(
                "FHE: {} (external capability)",
                outcome.fhe_parameters.scheme.as_deref().unwrap_or("unknown")
            ));
        }
        crypto_primitives_used.push("SHA-256 input fingerprint".to_string());
        crypto_primitives_used.push("SHA-256 hash commitment (canonical JSON)".to_string());

        let risk_context = if homomorphic {
            "Homomorphic evaluation with hash-commitment verification"
        } else {
            "Simulated evaluation with hash-commitment verification"
        };

        RunResult {
            schema_version: SCHEMA_VERSION,
            run_id: fresh_run_id(),
            timestamp_utc: now_string(),
            app_version: APP_VERSION.to_string(),
            scenario: scenario.to_string(),
            compute_result: outcome.result,
            risk_context: risk_context.to_string(),
            trust_model_comparison: TRUST_MODEL_COMPARISON.to_string(),
            benchmark,
            proof: ProofArtifact {
                proof_hash: verified.commitment().to_string(),
                verification_result: true,
                circuit_version: verified.circuit_version().to_string(),
                input_fingerprint: input_fingerprint.to_string(),
                crypto_primitives_used,
                fhe_parameters: outcome.fhe_parameters,
            },
            environment: self.record_environment.then(EnvironmentInfo::detect),
        }
    }
}

/// `run-` plus ten hex digits of a hash over wall-clock nanos, the process
/// id and a per-process counter.
fn fresh_run_id() -> String {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    let n = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = format!("{nanos}:{}:{n}", std::process::id());
    format!("run-{}", &sha256_hex(seed.as_bytes())[..10])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpsError;
    use crate::capability::{MockConfig, MockFailure, MockProvider};
    use crate::core::ComputeProvenance;
    use crate::proof::{self, Commitment};

    fn mock_pipeline(config: MockConfig) -> Pipeline {
        Pipeline::new("fhe-seal-v1", Arc::new(MockProvider::new(config))).with_environment(false)
    }

    fn demo_request() -> RunRequest {
        RunRequest::new(SensitiveInput::new("demo-sensitive"), "test-scenario")
    }

    /// Returns a different digest on every call.
    struct DriftingScheme(AtomicU64);

    impl CommitmentScheme for DriftingScheme {
        fn name(&self) -> &str {
            "drifting"
        }

        fn commit(&self, _statement: &ProofStatement<'_>) -> OpsResult<Commitment> {
            let n = self.0.fetch_add(1, Ordering::Relaxed);
            Ok(Commitment::from_hex(sha256_hex(&n.to_le_bytes())))
        }
    }

    #[test]
    fn test_forced_fallback_demo_run() {
        let pipeline = mock_pipeline(MockConfig::new("mock"));
        let result = pipeline.run(&demo_request().with_fallback(true)).unwrap();

        assert_eq!(result.compute_result.risk_reduction_percent, 54);
        assert_eq!(result.compute_result.performance_overhead_percent, 7);
        assert_eq!(result.compute_result.provenance, ComputeProvenance::Simulated);
        assert_eq!(result.benchmark.compute_mode, "simulated-forced");
        assert!(result.proof.verification_result);
        assert_eq!(result.proof.circuit_version, "fhe-seal-v1");
        assert_eq!(
            result.proof.input_fingerprint,
            "98ba5137d6c0e51a4ebb059537ca45190d7c030f20abd6c0f3c12c1ad3784192"
        );
        assert!(!result.proof.fhe_parameters.enabled);
        assert_eq!(result.proof.crypto_primitives_used.len(), 2);
        assert!(result.run_id.starts_with("run-"));
        assert_eq!(result.run_id.len(), 14);
        assert!(result.environment.is_none());
    }

    #[test]
    fn test_commitment_matches_free_function() {
        let pipeline = mock_pipeline(MockConfig::new("mock"));
        let result = pipeline.run(&demo_request().with_fallback(true)).unwrap();
        let fp = Fingerprint::from_hex(result.proof.input_fingerprint.clone());
        assert!(proof::verify(
            &Commitment::from_hex(result.proof.proof_hash.clone()),
            &fp,
            &result.compute_result,
            &result.scenario,
            &result.proof.circuit_version,
        ));
    }

    #[test]
    fn test_repeat_runs_share_commitment_not_run_id() {
        let pipeline = mock_pipeline(MockConfig::new("mock"));
        let a = pipeline.run(&demo_request().with_fallback(true)).unwrap();
        let b = pipeline.run(&demo_request().with_fallback(true)).unwrap();
        assert_eq!(a.proof.proof_hash, b.proof.proof_hash);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_homomorphic_run() {
        let pipeline = mock_pipeline(MockConfig::new("mock"));
        let result = pipeline.run(&demo_request()).unwrap();
        assert_eq!(result.benchmark.compute_mode, "fhe-homomorphic-encryption");
        assert_eq!(result.compute_result.risk_reduction_percent, 42);
        assert!(result.compute_result.fhe_enabled);
        assert!(result.proof.fhe_parameters.enabled);
        assert_eq!(result.proof.crypto_primitives_used[0], "FHE: MOCK (external capability)");
    }

    #[test]
    fn test_capability_failure_still_verifies() {
        let pipeline = mock_pipeline(MockConfig::new("mock").fails_at(MockFailure::Transform));
        let result = pipeline.run(&demo_request()).unwrap();
        assert_eq!(result.benchmark.compute_mode, "fallback-capability-error");
        assert!(result.compute_result.is_degraded());
        assert!(!result.compute_result.fhe_enabled);
        assert!(result.proof.verification_result);
    }

    #[test]
    fn test_circuit_version_changes_commitment() {
        let a = mock_pipeline(MockConfig::new("mock"))
            .run(&demo_request().with_fallback(true))
            .unwrap();
        let b = Pipeline::new("fhe-seal-v2", Arc::new(MockProvider::default_mock()))
            .with_environment(false)
            .run(&demo_request().with_fallback(true))
            .unwrap();
        assert_ne!(a.proof.proof_hash, b.proof.proof_hash);
    }

    #[test]
    fn test_verification_failure_aborts_run() {
        let pipeline = mock_pipeline(MockConfig::new("mock"))
            .with_scheme(Box::new(DriftingScheme(AtomicU64::new(0))));
        let err = pipeline.run(&demo_request().with_fallback(true)).unwrap_err();
        assert!(matches!(err, OpsError::VerificationFailed { .. }));
    }

    #[test]
    fn test_from_config_without_helper_degrades() {
        let pipeline = Pipeline::from_config(&PipelineConfig::default())
            .unwrap()
            .with_environment(false);
        let result = pipeline.run(&demo_request()).unwrap();
        match &result.compute_result.provenance {
            ComputeProvenance::Degraded { reason } => assert!(reason.contains("no FHE helper")),
            other => panic!("unexpected provenance {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_is_shareable_across_threads() {
        let pipeline = mock_pipeline(MockConfig::new("mock"));
        let hashes: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        pipeline
                            .run(&demo_request().with_fallback(true))
                            .unwrap()
                            .proof
                            .proof_hash
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    }
}
