//! Engine configuration.
//!
//! Every field has a default, so an empty TOML table is a valid config:
//!
//! ```toml
//! history_capacity = 10
//! success_status_ms = 2000
//! error_status_ms = 3000
//! # call_timeout_ms = 30000
//! record_id_prefix = "research"
//! recent_window_secs = 604800
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A setting that serde accepted but the engine cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigInvalid {
    #[error("history_capacity must be at least 1")]
    ZeroHistoryCapacity,
    #[error("record_id_prefix must not be empty")]
    EmptyRecordIdPrefix,
    #[error("call_timeout_ms must be positive when set")]
    ZeroCallTimeout,
}

/// Seven days.
const DEFAULT_RECENT_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Maximum number of operation history entries kept.
    pub history_capacity: usize,
    /// How long a success status stays visible.
    pub success_status_ms: u64,
    /// How long an error status stays visible.
    pub error_status_ms: u64,
    /// Upper bound on each gateway or encryption call. `None` waits forever.
    pub call_timeout_ms: Option<u64>,
    /// Prefix of generated record identifiers.
    pub record_id_prefix: String,
    /// Records newer than this count as recent uploads in the statistics.
    pub recent_window_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            success_status_ms: 2000,
            error_status_ms: 3000,
            call_timeout_ms: None,
            record_id_prefix: "research".to_string(),
            recent_window_secs: DEFAULT_RECENT_WINDOW_SECS,
        }
    }
}

impl WorkflowConfig {
    pub fn success_status_ttl(&self) -> Duration {
        Duration::from_millis(self.success_status_ms)
    }

    pub fn error_status_ttl(&self) -> Duration {
        Duration::from_millis(self.error_status_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        if self.history_capacity == 0 {
            return Err(ConfigInvalid::ZeroHistoryCapacity);
        }
        if self.record_id_prefix.trim().is_empty() {
            return Err(ConfigInvalid::EmptyRecordIdPrefix);
        }
        if self.call_timeout_ms == Some(0) {
            return Err(ConfigInvalid::ZeroCallTimeout);
        }
        Ok(())
    }
}
