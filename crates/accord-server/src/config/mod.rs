//! Configuration types for the Accord server.

mod engine;
mod listen;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use engine::{SandboxConfig, WiretestConfig};
pub use listen::{AdminConfig, ListenerConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub wirestub: ListenerConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub wiretest: WiretestConfig,
    /// Fallback log filter when RUST_LOG is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin.host.trim().is_empty() {
            anyhow::bail!("admin.host must not be empty");
        }
        if self.wirestub.host.trim().is_empty() {
            anyhow::bail!("wirestub.host must not be empty");
        }
        if self.wirestub.max_body_bytes == 0 {
            anyhow::bail!("wirestub.max_body_bytes must be greater than 0");
        }
        if self.sandbox.max_script_bytes == 0
            || self.sandbox.max_depth == 0
            || self.sandbox.max_nodes == 0
        {
            anyhow::bail!("sandbox limits must be greater than 0");
        }
        if self.sandbox.timeout_ms == 0 {
            anyhow::bail!("sandbox.timeout_ms must be greater than 0");
        }
        if self.wiretest.timeout_secs == 0 {
            anyhow::bail!("wiretest.timeout_secs must be greater than 0");
        }
        if let Some(level) = &self.log_level {
            if tracing_subscriber::EnvFilter::try_new(level).is_err() {
                anyhow::bail!("Invalid log_level '{}'", level);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
admin:
  port: 9000
wirestub:
  shutdown_timeout_ms: 250
sandbox:
  max_depth: 16
wiretest:
  parallel_contracts: false
log_level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.admin.port, 9000);
        assert_eq!(config.admin.host, "0.0.0.0");
        assert_eq!(config.wirestub.shutdown_timeout_ms, 250);
        assert_eq!(config.wirestub.max_body_bytes, 5 * 1024 * 1024);
        assert_eq!(config.sandbox.max_depth, 16);
        assert_eq!(config.sandbox.max_nodes, 20_000);
        assert!(!config.wiretest.parallel_contracts);
        assert_eq!(config.wiretest.timeout_secs, 10);
        assert_eq!(config.log_level(), "debug");
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.admin.port, 8000);
        assert_eq!(config.sandbox.timeout_ms, 1000);
        assert_eq!(config.log_level(), "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.sandbox.max_nodes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.wirestub.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin:\n  host: 127.0.0.1\n  port: 8123").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.admin.host, "127.0.0.1");
        assert_eq!(config.admin.port, 8123);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wiretest:\n  timeout_secs: 0").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }
}
