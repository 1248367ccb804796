//! CLI command handler for `verify`.
//!
//! Re-derives the commitment of stored run records and compares it with the
//! recorded `proof_hash`. Optionally checks the records against the original
//! input.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::{Fingerprint, RunResult, SCHEMA_VERSION, SensitiveInput, fingerprint};
use crate::proof::{self, Commitment};
use crate::storage::{HistoryLog, read_json};
use crate::{OpsError, OpsResult};

/// Outcome of re-verifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordVerdict {
    pub run_id: String,
    /// The record's schema version is the one this build writes.
    pub schema_ok: bool,
    /// The record itself claims `verification_result: true`.
    pub recorded_verified: bool,
    pub commitment_ok: bool,
    /// `None` when no input was supplied.
    pub input_matches: Option<bool>,
}

impl RecordVerdict {
    pub fn passed(&self) -> bool {
        self.schema_ok
            && self.recorded_verified
            && self.commitment_ok
            && self.input_matches.unwrap_or(true)
    }
}

/// Re-verify a single record.
pub fn verify_record(record: &RunResult, input: Option<&SensitiveInput>) -> RecordVerdict {
    let recorded_fp = Fingerprint::from_hex(record.proof.input_fingerprint.clone());
    let commitment_ok = proof::verify(
        &Commitment::from_hex(record.proof.proof_hash.clone()),
        &recorded_fp,
        &record.compute_result,
        &record.scenario,
        &record.proof.circuit_version,
    );
    let input_matches = input.map(|value| fingerprint(value) == recorded_fp);
    RecordVerdict {
        run_id: record.run_id.clone(),
        schema_ok: record.schema_version == SCHEMA_VERSION,
        recorded_verified: record.proof.verification_result,
        commitment_ok,
        input_matches,
    }
}

/// Re-verify every record in `records`.
pub fn verify_records(records: &[RunResult], input: Option<&SensitiveInput>) -> Vec<RecordVerdict> {
    records.iter().map(|r| verify_record(r, input)).collect()
}

/// Load records from a JSON document and/or a JSONL history file.
pub fn load_records(record: Option<PathBuf>, history: Option<PathBuf>) -> OpsResult<Vec<RunResult>> {
    let mut records = Vec::new();
    if let Some(path) = record {
        records.push(read_json(&path)?);
    }
    if let Some(path) = history {
        records.extend(HistoryLog::new(path).records(None)?);
    }
    if records.is_empty() {
        return Err(OpsError::InvalidInput(
            "nothing to verify: pass --record and/or --history".into(),
        ));
    }
    Ok(records)
}

/// Run the `verify` command.
///
/// Fails if any record does not re-verify.
pub fn run(
    record: Option<PathBuf>,
    history: Option<PathBuf>,
    input: Option<SensitiveInput>,
) -> OpsResult<()> {
    let records = load_records(record, history)?;
    let verdicts = verify_records(&records, input.as_ref());

    let mut failed = 0usize;
    for v in &verdicts {
        let status = if v.passed() { "OK" } else { "FAILED" };
        let mut notes = vec![format!("commitment {}", v.commitment_ok)];
        if !v.schema_ok {
            notes.push("unsupported schema version".into());
        }
        if !v.recorded_verified {
            notes.push("recorded as unverified".into());
        }
        match v.input_matches {
            Some(true) => notes.push("input matches".into()),
            Some(false) => notes.push("input does not match".into()),
            None => {}
        }
        println!("{} {} ({})", status, v.run_id, notes.join(", "));
        if !v.passed() {
            warn!(run_id = %v.run_id, "record failed re-verification");
            failed += 1;
        }
    }
    info!(total = verdicts.len(), failed, "verification finished");

    if failed > 0 {
        return Err(OpsError::Message(format!(
            "{failed} of {} record(s) failed verification",
            verdicts.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MockProvider;
    use crate::engine::{Pipeline, RunRequest};
    use std::sync::Arc;

    fn record() -> RunResult {
        Pipeline::new("fhe-seal-v1", Arc::new(MockProvider::default_mock()))
            .with_environment(false)
            .run(&RunRequest::new(SensitiveInput::new("demo-sensitive"), "s"))
            .unwrap()
    }

    #[test]
    fn test_untouched_record_verifies() {
        let v = verify_record(&record(), None);
        assert!(v.commitment_ok);
        assert_eq!(v.input_matches, None);
        assert!(v.passed());
    }

    #[test]
    fn test_tampered_result_fails() {
        let mut r = record();
        r.compute_result.risk_reduction_percent += 1;
        assert!(!verify_record(&r, None).passed());
    }

    #[test]
    fn test_tampered_circuit_version_fails() {
        let mut r = record();
        r.proof.circuit_version = "fhe-seal-v2".into();
        assert!(!verify_record(&r, None).commitment_ok);
    }

    #[test]
    fn test_record_marked_unverified_fails() {
        let mut r = record();
        r.proof.verification_result = false;
        let v = verify_record(&r, None);
        assert!(v.commitment_ok);
        assert!(!v.recorded_verified);
        assert!(!v.passed());
    }

    #[test]
    fn test_foreign_schema_version_fails() {
        let mut r = record();
        r.schema_version = SCHEMA_VERSION + 1;
        let v = verify_record(&r, None);
        assert!(!v.schema_ok);
        assert!(!v.passed());
    }

    #[test]
    fn test_input_check() {
        let r = record();
        let good = verify_record(&r, Some(&SensitiveInput::new("demo-sensitive")));
        assert_eq!(good.input_matches, Some(true));
        let bad = verify_record(&r, Some(&SensitiveInput::new("other")));
        assert_eq!(bad.input_matches, Some(false));
        assert!(bad.commitment_ok);
        assert!(!bad.passed());
    }

    #[test]
    fn test_nothing_to_verify() {
        assert!(matches!(load_records(None, None), Err(OpsError::InvalidInput(_))));
    }
}
