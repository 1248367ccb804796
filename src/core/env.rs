//! Host environment detection for the run audit trail.

use serde::{Deserialize, Serialize};

/// Environment information recorded alongside a verified run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ram_bytes: Option<u64>,

    pub os: String,

    pub arch: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        EnvironmentInfo {
            cpu_model: None,
            cpu_cores: None,
            total_ram_bytes: None,
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: None,
        }
    }
}

impl EnvironmentInfo {
    /// Detect environment information from the current system
    pub fn detect() -> Self {
        use sysinfo::System;

        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let cpu_model = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|s| !s.is_empty());
        let cpu_cores = sys.physical_core_count().map(|c| c as u32);
        let total_ram_bytes = Some(sys.total_memory()).filter(|b| *b > 0);
        let os = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
        let hostname = System::host_name();

        EnvironmentInfo {
            cpu_model,
            cpu_cores,
            total_ram_bytes,
            os,
            arch: std::env::consts::ARCH.to_string(),
            hostname,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_detect_has_os() {
        let env = EnvironmentInfo::detect();
        assert!(!env.os.is_empty());
        assert!(!env.arch.is_empty());
    }

    #[test]
    fn test_environment_default() {
        let env = EnvironmentInfo::default();
        assert!(!env.os.is_empty());
        assert!(env.cpu_model.is_none());
        assert!(env.hostname.is_none());
    }
}
