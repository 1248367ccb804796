//! CLI command handler for `run`.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::OpsResult;
use crate::config::PipelineConfig;
use crate::core::{RunResult, SensitiveInput};
use crate::engine::{Pipeline, RunRequest};
use crate::report::write_markdown;
use crate::storage::{HistoryLog, export_json};

/// Where a run's artifacts should go.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub markdown: bool,
    pub history: Option<PathBuf>,
}

/// A verified run and the files written for it.
#[derive(Debug)]
pub struct RunOutputs {
    pub result: RunResult,
    pub json_path: PathBuf,
    pub markdown_path: Option<PathBuf>,
}

/// Run the pipeline and export its artifacts. Nothing is written unless the
/// run verified, and a failing export step removes the files written before
/// it.
pub fn execute_and_export(
    pipeline: &Pipeline,
    request: &RunRequest,
    options: &ExportOptions,
) -> OpsResult<RunOutputs> {
    let result = pipeline.run(request)?;

    let mut written = Vec::new();
    match export(&result, options, &mut written) {
        Ok((json_path, markdown_path)) => Ok(RunOutputs {
            result,
            json_path,
            markdown_path,
        }),
        Err(e) => {
            for path in &written {
                if let Err(rm) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %rm, "failed to remove partial export");
                }
            }
            warn!(run_id = %result.run_id, error = %e, "export failed, partial files removed");
            Err(e)
        }
    }
}

/// Write the per-run files, then the history line. `written` collects every
/// file created so far.
fn export(
    result: &RunResult,
    options: &ExportOptions,
    written: &mut Vec<PathBuf>,
) -> OpsResult<(PathBuf, Option<PathBuf>)> {
    let json_path = export_json(result, &options.output_dir)?;
    written.push(json_path.clone());

    let markdown_path = if options.markdown {
        let path = write_markdown(result, &options.output_dir)?;
        written.push(path.clone());
        Some(path)
    } else {
        None
    };

    if let Some(history) = &options.history {
        HistoryLog::new(history).append(result)?;
        info!(path = %history.display(), "appended run to history");
    }
    Ok((json_path, markdown_path))
}

/// Run the `run` command.
///
/// # Arguments
/// * `input` - Sensitive input; only its fingerprint leaves this process
/// * `scenario` - Scenario label, or the configured default
/// * `force_fallback` - Skip the homomorphic capability
/// * `config` - Resolved configuration
/// * `markdown` - Also write the Markdown report
pub fn run(
    input: SensitiveInput,
    scenario: Option<String>,
    force_fallback: bool,
    config: &PipelineConfig,
    markdown: bool,
) -> OpsResult<()> {
    let pipeline = Pipeline::from_config(config)?;
    let scenario = scenario.unwrap_or_else(|| config.scenario.clone());
    let request = RunRequest::new(input, scenario).with_fallback(force_fallback);
    let options = ExportOptions {
        output_dir: config.output_dir.clone(),
        markdown,
        history: config.history.clone(),
    };

    let outputs = execute_and_export(&pipeline, &request, &options)?;
    print_summary(&outputs);
    Ok(())
}

fn print_summary(outputs: &RunOutputs) {
    let result = &outputs.result;
    println!("Verification: {}", result.proof.verification_result);
    println!("Run ID: {}", result.run_id);
    println!("Scenario: {}", result.scenario);
    println!("Mode: {}", result.benchmark.compute_mode);
    println!(
        "Risk reduction: {}% | Overhead: {}% | Rollout: {}",
        result.compute_result.risk_reduction_percent,
        result.compute_result.performance_overhead_percent,
        result.compute_result.recommended_rollout.as_str()
    );
    println!("Runtime: {}ms", result.benchmark.runtime_ms);
    println!("Commitment: {}", result.proof.proof_hash);
    println!("JSON: {}", outputs.json_path.display());
    if let Some(md) = &outputs.markdown_path {
        println!("Markdown: {}", md.display());
    }
    println!("Primitives:");
    for p in &result.proof.crypto_primitives_used {
        println!("  - {p}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{MockConfig, MockProvider};
    use std::sync::Arc;

    #[test]
    fn test_execute_and_export_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            Pipeline::new("fhe-seal-v1", Arc::new(MockProvider::new(MockConfig::new("mock"))))
                .with_environment(false);
        let request = RunRequest::new(SensitiveInput::new("demo-sensitive"), "s");
        let options = ExportOptions {
            output_dir: dir.path().join("out"),
            markdown: true,
            history: Some(dir.path().join("history.jsonl")),
        };

        let outputs = execute_and_export(&pipeline, &request, &options).unwrap();
        assert!(outputs.json_path.is_file());
        assert!(outputs.markdown_path.as_ref().unwrap().is_file());
        assert_eq!(HistoryLog::new(dir.path().join("history.jsonl")).len().unwrap(), 1);
        assert!(
            outputs
                .json_path
                .to_string_lossy()
                .ends_with(&format!("{}.json", outputs.result.run_id))
        );
    }

    #[test]
    fn test_markdown_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new("fhe-seal-v1", Arc::new(MockProvider::default_mock()))
            .with_environment(false);
        let request =
            RunRequest::new(SensitiveInput::new("demo-sensitive"), "s").with_fallback(true);
        let options = ExportOptions {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let outputs = execute_and_export(&pipeline, &request, &options).unwrap();
        assert!(outputs.markdown_path.is_none());
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_history_failure_removes_run_files() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new("fhe-seal-v1", Arc::new(MockProvider::default_mock()))
            .with_environment(false);
        let request = RunRequest::new(SensitiveInput::new("demo-sensitive"), "s");
        // a directory cannot be opened for appending
        let history = dir.path().join("history");
        std::fs::create_dir(&history).unwrap();
        let out = dir.path().join("out");
        let options = ExportOptions {
            output_dir: out.clone(),
            markdown: true,
            history: Some(history),
        };

        assert!(execute_and_export(&pipeline, &request, &options).is_err());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }
}
