//! External-process homomorphic capability.
//!
//! The FHE library itself lives behind a helper command. Each opened instance
//! owns a private temporary context directory where the helper keeps its key
//! material and ciphertext files; the directory is removed on drop.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use shlex::Shlex;
use tempfile::TempDir;
use tracing::debug;
use zeroize::Zeroizing;

use super::traits::{CapabilityError, CapabilityProvider, Ciphertext, HomomorphicCapability};
use crate::core::FheParameters;

/// Configuration for the external helper.
#[derive(Debug, Clone)]
pub struct ExternalConfig {
    /// Program followed by fixed leading arguments
    pub command: Vec<String>,
    /// Per-call timeout; zero disables it
    pub timeout: Duration,
    /// Parameter metadata reported for this helper
    pub parameters: FheParameters,
}

impl ExternalConfig {
    /// Parse a shell-style command line (e.g. `python3 tools/seal_helper.py`).
    pub fn from_command_line(
        command_line: &str,
        parameters: FheParameters,
    ) -> Result<Self, CapabilityError> {
        let command: Vec<String> = Shlex::new(command_line).collect();
        if command.is_empty() {
            return Err(CapabilityError::Unavailable("empty helper command".into()));
        }
        Ok(ExternalConfig {
            command,
            timeout: Duration::ZERO,
            parameters,
        })
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        cmd
    }
}

/// Provider spawning the helper for every operation.
#[derive(Debug, Clone)]
pub struct ExternalProvider {
    config: ExternalConfig,
}

impl ExternalProvider {
    pub fn new(config: ExternalConfig) -> Self {
        ExternalProvider { config }
    }
}

impl CapabilityProvider for ExternalProvider {
    fn name(&self) -> &str {
        "external"
    }

    fn open(&self) -> Result<Box<dyn HomomorphicCapability>, CapabilityError> {
        let context = tempfile::Builder::new()
            .prefix("quantumproof-fhe-")
            .tempdir()
            .map_err(|e| CapabilityError::Unavailable(format!("failed to create context dir: {e}")))?;
        let capability = ExternalCapability {
            config: self.config.clone(),
            context,
            seq: AtomicU32::new(0),
        };
        capability.run_op("keygen", &[])?;
        debug!(context = %capability.context.path().display(), "external capability opened");
        Ok(Box::new(capability))
    }
}

/// One opened helper context.
pub struct ExternalCapability {
    config: ExternalConfig,
    context: TempDir,
    seq: AtomicU32,
}

impl ExternalCapability {
    fn next_ciphertext_path(&self) -> PathBuf {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        self.context.path().join(format!("ct-{n}.bin"))
    }

    /// Run one helper operation and return its trimmed stdout.
    fn run_op(&self, op: &'static str, args: &[&str]) -> Result<String, CapabilityError> {
        let stdout_path = self.context.path().join(format!("{op}.stdout"));
        let stderr_path = self.context.path().join(format!("{op}.stderr"));
        let stdout = File::create(&stdout_path).map_err(CapabilityError::Spawn)?;
        let stderr = File::create(&stderr_path).map_err(CapabilityError::Spawn)?;

        let mut cmd = self.config.base_command();
        cmd.arg(op).arg("--context").arg(self.context.path());
        cmd.args(args);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        let status = run_with_timeout(cmd, self.config.timeout, op)?;
        if !status.success() {
            let err = std::fs::read(&stderr_path).map_err(CapabilityError::Spawn)?;
            return Err(CapabilityError::Failed {
                op,
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&err).trim().to_string(),
            });
        }
        let out = std::fs::read_to_string(&stdout_path).map_err(CapabilityError::Spawn)?;
        Ok(out.trim().to_string())
    }

    fn expect_file(op: &'static str, path: &Path) -> Result<Ciphertext, CapabilityError> {
        if !path.is_file() {
            return Err(CapabilityError::Malformed {
                op,
                detail: format!("helper did not write {}", path.display()),
            });
        }
        Ok(Ciphertext::new(path.to_string_lossy()))
    }

    fn owned_path<'a>(
        &self,
        op: &'static str,
        ciphertext: &'a Ciphertext,
    ) -> Result<&'a Path, CapabilityError> {
        let path = Path::new(ciphertext.token());
        if !path.starts_with(self.context.path()) {
            return Err(CapabilityError::Malformed {
                op,
                detail: "ciphertext belongs to another context".into(),
            });
        }
        Ok(path)
    }
}

impl HomomorphicCapability for ExternalCapability {
    fn name(&self) -> &str {
        "external"
    }

    fn parameters(&self) -> FheParameters {
        self.config.parameters.clone()
    }

    fn encrypt(&self, value: f64) -> Result<Ciphertext, CapabilityError> {
        // the plaintext goes through a private file, never argv
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let value_path = self.context.path().join(format!("pt-{n}.txt"));
        std::fs::write(&value_path, Zeroizing::new(value.to_string()).as_bytes())
            .map_err(CapabilityError::Spawn)?;

        let out = self.next_ciphertext_path();
        let value_s = value_path.to_string_lossy();
        let out_s = out.to_string_lossy();
        let ran = self.run_op("encrypt", &["--value-file", &value_s, "--out", &out_s]);
        if let Err(e) = std::fs::remove_file(&value_path) {
            debug!(error = %e, "failed to remove plaintext file");
        }
        ran?;
        Self::expect_file("encrypt", &out)
    }

    fn affine_transform(
        &self,
        ciphertext: &Ciphertext,
        scale: f64,
        shift: f64,
    ) -> Result<Ciphertext, CapabilityError> {
        let input = self.owned_path("affine", ciphertext)?;
        let out = self.next_ciphertext_path();
        let (scale, shift) = (scale.to_string(), shift.to_string());
        let input_s = input.to_string_lossy();
        let out_s = out.to_string_lossy();
        self.run_op(
            "affine",
            &[
                "--ciphertext",
                &input_s,
                "--scale",
                &scale,
                "--shift",
                &shift,
                "--out",
                &out_s,
            ],
        )?;
        Self::expect_file("affine", &out)
    }

    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<f64, CapabilityError> {
        let input = self.owned_path("decrypt", ciphertext)?;
        let input_s = input.to_string_lossy();
        let stdout = self.run_op("decrypt", &["--ciphertext", &input_s])?;
        stdout
            .lines()
            .last()
            .map(str::trim)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| CapabilityError::Malformed {
                op: "decrypt",
                detail: format!("expected a decimal scalar, got {stdout:?}"),
            })
    }
}

/// Wait for a helper process, killing it when the timeout elapses.
fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    op: &'static str,
) -> Result<ExitStatus, CapabilityError> {
    let start = Instant::now();
    let mut child = cmd.spawn().map_err(CapabilityError::Spawn)?;

    loop {
        if let Some(status) = child.try_wait().map_err(CapabilityError::Spawn)? {
            debug!(op, elapsed_ms = start.elapsed().as_millis() as u64, "helper finished");
            return Ok(status);
        }

        if !timeout.is_zero() && start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CapabilityError::Timeout { op });
        }

        std::thread::sleep(Duration::from_millis(5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses_command_line() {
        let config = ExternalConfig::from_command_line(
            "python3 'tools/seal helper.py'",
            FheParameters::disabled(),
        )
        .unwrap();
        assert_eq!(config.command, vec!["python3", "tools/seal helper.py"]);
        assert!(config.timeout.is_zero());
    }

    #[test]
    fn test_config_rejects_empty_command() {
        let err = ExternalConfig::from_command_line("   ", FheParameters::disabled()).unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable(_)));
    }

    #[test]
    fn test_missing_helper_is_spawn_error() {
        let config = ExternalConfig::from_command_line(
            "/nonexistent/quantumproof-helper",
            FheParameters::disabled(),
        )
        .unwrap();
        let err = ExternalProvider::new(config).open().err().unwrap();
        assert!(matches!(err, CapabilityError::Spawn(_)));
    }
}
