//! Append-only JSONL history of verified runs, one `RunResult` per line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::core::{RunResult, SCHEMA_VERSION};
use crate::{OpsError, OpsResult};

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        HistoryLog {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one record as a single line.
    ///
    /// # Errors
    /// - `InvalidInput` for a record of another schema version or one that
    ///   did not pass verification; the file is left untouched
    /// - `Anyhow` for file system failures
    pub fn append(&self, record: &RunResult) -> OpsResult<()> {
        check_loggable(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        // one write per record keeps concurrent appenders line-aligned
        file.write_all(line.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }

    /// Every record in file order, optionally only those of `scenario`.
    pub fn records(&self, scenario: Option<&str>) -> OpsResult<Vec<RunResult>> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let mut out = Vec::new();
        for (n, line) in numbered_lines(&text) {
            let record: RunResult = serde_json::from_str(line).map_err(|e| {
                OpsError::Message(format!("{}:{n}: bad record: {e}", self.path.display()))
            })?;
            if scenario.is_none_or(|s| record.scenario == s) {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Number of records; a missing file holds none.
    pub fn len(&self) -> OpsResult<usize> {
        if !self.exists() {
            return Ok(0);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        Ok(numbered_lines(&text).count())
    }

    pub fn is_empty(&self) -> OpsResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn check_loggable(record: &RunResult) -> OpsResult<()> {
    if record.schema_version != SCHEMA_VERSION {
        return Err(OpsError::InvalidInput(format!(
            "schema version mismatch: record has v{}, expected v{SCHEMA_VERSION}",
            record.schema_version
        )));
    }
    if !record.proof.verification_result {
        return Err(OpsError::InvalidInput(format!(
            "refusing to log unverified run {}",
            record.run_id
        )));
    }
    Ok(())
}

/// Non-blank lines with 1-based line numbers.
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::UnavailableProvider;
    use crate::core::SensitiveInput;
    use crate::engine::{Pipeline, RunRequest};
    use std::sync::Arc;

    fn make_record(scenario: &str) -> RunResult {
        let request =
            RunRequest::new(SensitiveInput::new("demo-sensitive"), scenario).with_fallback(true);
        Pipeline::new("fhe-seal-v1", Arc::new(UnavailableProvider::new("test")))
            .with_environment(false)
            .run(&request)
            .unwrap()
    }

    #[test]
    fn test_schema_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history.jsonl"));

        let mut record = make_record("s");
        record.schema_version = 999;

        let err = log.append(&record).unwrap_err();
        assert!(err.to_string().contains("schema version mismatch"));
        assert!(!log.exists());
    }

    #[test]
    fn test_unverified_record_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history.jsonl"));

        let mut record = make_record("s");
        record.proof.verification_result = false;
        assert!(matches!(log.append(&record), Err(OpsError::InvalidInput(_))));
        assert!(!log.exists());
    }

    #[test]
    fn test_append_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("nested/history.jsonl"));
        assert!(log.is_empty().unwrap());

        for s in ["alpha", "beta", "alpha"] {
            log.append(&make_record(s)).unwrap();
        }

        assert_eq!(log.len().unwrap(), 3);
        let all = log.records(None).unwrap();
        assert_eq!(
            all.iter().map(|r| r.scenario.as_str()).collect::<Vec<_>>(),
            ["alpha", "beta", "alpha"]
        );
        let alpha = log.records(Some("alpha")).unwrap();
        assert_eq!(alpha.len(), 2);
        assert!(alpha.iter().all(|r| r.scenario == "alpha"));
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let log = HistoryLog::new(&path);
        log.append(&make_record("s")).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"\n{not json}\n")
            .unwrap();

        let err = log.records(None).unwrap_err();
        assert!(err.to_string().contains(":3: bad record"), "{err}");
    }

    #[test]
    fn test_read_missing_file() {
        let log = HistoryLog::new("/nonexistent/history.jsonl");
        assert!(log.records(None).is_err());
        assert_eq!(log.len().unwrap(), 0);
    }
}
