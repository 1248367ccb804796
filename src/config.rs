//! Pipeline configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::compute::DEFAULT_OVERHEAD_PERCENT;
use crate::core::FheParameters;
use crate::{DEFAULT_CIRCUIT_VERSION, OpsError, OpsResult};

pub const DEFAULT_CONFIG: &str = "quantumproof.toml";
pub const DEFAULT_SCENARIO: &str = "credit-risk";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
/// Environment override for the FHE helper command.
pub const FHE_COMMAND_ENV: &str = "QUANTUMPROOF_FHE_COMMAND";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FheConfig {
    pub command: Option<String>,
    pub timeout_secs: u64,
    pub overhead_percent: u32,
    pub scheme: String,
    pub poly_modulus_degree: u32,
    pub coeff_mod_bit_sizes: Vec<u32>,
    pub global_scale_bits: u32,
    pub security_level: String,
    pub library: String,
}

impl Default for FheConfig {
    fn default() -> Self {
        FheConfig {
            command: None,
            timeout_secs: 0,
            overhead_percent: DEFAULT_OVERHEAD_PERCENT,
            scheme: "CKKS".to_string(),
            poly_modulus_degree: 8192,
            coeff_mod_bit_sizes: vec![60, 40, 40, 60],
            global_scale_bits: 40,
            security_level: "128-bit".to_string(),
            library: "Microsoft SEAL".to_string(),
        }
    }
}

impl FheConfig {
    pub fn parameters(&self) -> FheParameters {
        FheParameters {
            enabled: true,
            scheme: Some(self.scheme.clone()),
            poly_modulus_degree: Some(self.poly_modulus_degree),
            coeff_mod_bit_sizes: Some(self.coeff_mod_bit_sizes.clone()),
            global_scale_bits: Some(self.global_scale_bits),
            security_level: Some(self.security_level.clone()),
            library: Some(self.library.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub circuit_version: String,
    pub scenario: String,
    pub output_dir: PathBuf,
    pub history: Option<PathBuf>,
    pub fhe: FheConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            circuit_version: DEFAULT_CIRCUIT_VERSION.to_string(),
            scenario: DEFAULT_SCENARIO.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            history: None,
            fhe: FheConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> OpsResult<Self> {
        let cfg: PipelineConfig = toml::from_str(s).map_err(|e| OpsError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> OpsResult<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| OpsError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Load an explicit config file, or `quantumproof.toml` when it exists,
    /// or fall back to defaults. Applies the helper-command env override.
    pub fn resolve(explicit: Option<&Path>) -> OpsResult<Self> {
        let mut cfg = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG).is_file() => Self::load(Path::new(DEFAULT_CONFIG))?,
            None => Self::default(),
        };
        if let Ok(cmd) = std::env::var(FHE_COMMAND_ENV) {
            if !cmd.trim().is_empty() {
                cfg.fhe.command = Some(cmd);
            }
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> OpsResult<()> {
        if self.circuit_version.trim().is_empty() {
            return Err(OpsError::Config("circuit_version must not be empty".into()));
        }
        if self.scenario.trim().is_empty() {
            return Err(OpsError::Config("scenario must not be empty".into()));
        }
        if self.fhe.overhead_percent == 0 {
            return Err(OpsError::Config("fhe.overhead_percent must be positive".into()));
        }
        Ok(())
    }
}
