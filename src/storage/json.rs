//! Per-run JSON document export.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::OpsResult;
use crate::core::RunResult;

/// Write `<output_dir>/<run_id>.json` (pretty-printed) and return its path.
pub fn export_json(result: &RunResult, output_dir: &Path) -> OpsResult<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(format!("{}.json", result.run_id));
    let body = serde_json::to_string_pretty(result)?;
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Read a run record previously written by `export_json`.
pub fn read_json(path: &Path) -> OpsResult<RunResult> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_slice(&bytes)?)
}
