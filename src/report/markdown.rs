//! Markdown audit report for a verified run.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::core::{ComputeProvenance, RunResult};
use crate::{APP_VERSION, OpsResult};

/// Render a run as a Markdown report.
pub fn render_markdown(result: &RunResult) -> String {
    let mut out = String::new();

    out.push_str("# QuantumProof Ops - Computation Report\n\n");

    out.push_str("## Run Metadata\n\n");
    out.push_str(&format!(
        "| | |\n|---|---|\n\
         | **Run ID** | `{}` |\n\
         | **Timestamp** | `{}` |\n\
         | **Scenario** | `{}` |\n\
         | **Verification** | {} |\n\n",
        result.run_id,
        result.timestamp_utc,
        result.scenario,
        if result.proof.verification_result {
            "✅ VERIFIED"
        } else {
            "❌ FAILED"
        }
    ));

    out.push_str("## Cryptographic Primitives\n\n");
    for p in &result.proof.crypto_primitives_used {
        out.push_str(&format!("- {}\n", p));
    }
    out.push('\n');

    out.push_str("## FHE Parameters\n\n```json\n");
    out.push_str(
        &serde_json::to_string_pretty(&result.proof.fhe_parameters)
            .unwrap_or_else(|_| "{}".to_string()),
    );
    out.push_str("\n```\n\n");

    let cr = &result.compute_result;
    out.push_str("## Results\n\n");
    out.push_str(&format!(
        "| Metric | Value |\n|--------|-------|\n\
         | Risk Reduction | {}% |\n\
         | Overhead | {}% |\n\
         | Recommended Rollout | {} |\n\
         | FHE Enabled | {} |\n\n",
        cr.risk_reduction_percent,
        cr.performance_overhead_percent,
        cr.recommended_rollout.as_str(),
        cr.fhe_enabled
    ));
    if let ComputeProvenance::Degraded { reason } = &cr.provenance {
        out.push_str(&format!(
            "> ⚠️ Homomorphic capability failed; simulated fallback used: {}\n\n",
            reason
        ));
    }

    let b = &result.benchmark;
    out.push_str("## Performance\n\n");
    out.push_str(&format!(
        "| Stage | Time |\n|-------|------|\n\
         | Total | {}ms |\n\
         | Fingerprint | {}ms |\n\
         | Encryption | {}ms |\n\
         | Computation | {}ms |\n\
         | Proof Gen | {}ms |\n\
         | Verification | {}ms |\n\n\
         Mode: `{}`\n\n",
        b.runtime_ms,
        b.fingerprint_time_ms,
        b.encryption_time_ms,
        b.computation_time_ms,
        b.proof_time_ms,
        b.verify_time_ms,
        b.compute_mode
    ));

    out.push_str("## Audit Trail\n\n");
    out.push_str(&format!(
        "- **Commitment**: `{}`\n\
         - **Circuit Version**: `{}`\n\
         - **Input Fingerprint**: `{}`\n",
        result.proof.proof_hash, result.proof.circuit_version, result.proof.input_fingerprint
    ));
    if let Some(env) = &result.environment {
        out.push_str(&format!(
            "- **Host**: {} {} ({})\n",
            env.os,
            env.arch,
            env.cpu_model.as_deref().unwrap_or("-")
        ));
    }

    out.push_str(&format!(
        "\n---\n*Generated by QuantumProof Ops v{}*\n",
        APP_VERSION
    ));
    out
}

/// Write `<output_dir>/<run_id>.md` and return its path.
pub fn write_markdown(result: &RunResult, output_dir: &Path) -> OpsResult<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(format!("{}.md", result.run_id));
    std::fs::write(&path, render_markdown(result))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
