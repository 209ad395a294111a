//! CLI configuration.
//!
//! Loaded from a TOML file. Every section is optional:
//!
//! ```toml
//! [workflow]
//! history_capacity = 10
//! call_timeout_ms = 30000
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [chain]
//! contract_address = "0x00000000000000000000000000000000000c0ffe"
//! wallet_address = "0x1111111111111111111111111111111111111111"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vault_workflow::{ConfigInvalid, WorkflowConfig};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vault.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid config: {0}")]
    Workflow(#[from] ConfigInvalid),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub chain: ChainSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

/// Addresses for the in-memory contract and the simulated wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    pub contract_address: String,
    pub wallet_address: String,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            contract_address: "0x00000000000000000000000000000000000c0ffe".to_string(),
            wallet_address: "0x1111111111111111111111111111111111111111".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for this invocation.
    ///
    /// An explicit path must exist. Without one, `vault.toml` in the working
    /// directory is used if present, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workflow.validate()?;
        if self.chain.contract_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "chain.contract_address must not be empty".to_string(),
            ));
        }
        if self.chain.wallet_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "chain.wallet_address must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("vault.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn empty_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load(&write(&dir, "")).unwrap();
        assert_eq!(config.workflow, WorkflowConfig::default());
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
    }

    #[test]
    fn sections_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[workflow]
history_capacity = 5
call_timeout_ms = 250

[logging]
level = "debug"

[chain]
wallet_address = "0xabc"
"#,
        );
        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.workflow.history_capacity, 5);
        assert_eq!(config.workflow.call_timeout_ms, Some(250));
        assert_eq!(config.workflow.success_status_ms, 2000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.chain.wallet_address, "0xabc");
        assert_eq!(
            config.chain.contract_address,
            ChainSettings::default().contract_address
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = CliConfig::resolve(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let err = CliConfig::load(&write(&dir, "[workflow\n")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_workflow_settings_are_refused() {
        let dir = TempDir::new().unwrap();
        let err = CliConfig::load(&write(&dir, "[workflow]\nhistory_capacity = 0\n")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Workflow(ConfigInvalid::ZeroHistoryCapacity)
        ));
    }

    #[test]
    fn blank_wallet_is_refused() {
        let dir = TempDir::new().unwrap();
        let err = CliConfig::load(&write(&dir, "[chain]\nwallet_address = \"\"\n")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
