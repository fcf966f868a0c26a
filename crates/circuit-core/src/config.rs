//! Runtime configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration loaded from `config.toml`.
///
/// Every field has a default, so an empty or partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// How often display observers re-read the session (milliseconds)
    pub poll_interval_ms: u64,
    /// How often each coach client runs an auto-advance check (milliseconds)
    pub auto_advance_interval_ms: u64,
    /// Overrides the platform data directory for sessions and templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            auto_advance_interval_ms: 1000,
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}
