//! Unified path management for Circuit files.
//!
//! Platform directories come from the `dirs` crate. Tests and embedded
//! deployments pass a base directory instead, which then holds everything.

use circuit_core::config::CircuitConfig;
use circuit_core::error::CircuitError;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "CIRCUIT_DATA_DIR";

const APP_DIR: &str = "circuit";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform has no config directory (no home directory).
    ConfigDirNotFound,
    /// The platform has no data directory.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for CircuitError {
    fn from(err: PathError) -> Self {
        CircuitError::config(err.to_string())
    }
}

/// Path resolution for Circuit.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/circuit/          # Config directory
/// └── config.toml             # CircuitConfig
///
/// ~/.local/share/circuit/     # Data directory
/// ├── sessions/               # One JSON file per session
/// └── templates/              # <template-id>.toml
/// ```
#[derive(Debug, Clone, Default)]
pub struct CircuitPaths {
    config_base: Option<PathBuf>,
    data_base: Option<PathBuf>,
}

impl CircuitPaths {
    /// Creates a path resolver.
    ///
    /// With `Some(base)` both the config and the data directory are `base`.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            config_base: base.map(Path::to_path_buf),
            data_base: base.map(Path::to_path_buf),
        }
    }

    /// Applies the data directory overrides, `CIRCUIT_DATA_DIR` first and
    /// then `config.data_dir`.
    pub fn with_config(self, config: &CircuitConfig) -> Self {
        let env_override = std::env::var_os(DATA_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        self.with_data_dir(env_override.or_else(|| config.data_dir.clone()))
    }

    /// Replaces the data directory when `data_dir` is `Some`.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_base = Some(dir);
        }
        self
    }

    /// Returns the configuration directory (e.g. `~/.config/circuit/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.config_base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    /// Returns the data directory (e.g. `~/.local/share/circuit/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.data_base {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::DataDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn sessions_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("sessions"))
    }

    pub fn templates_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("templates"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_override_holds_everything() {
        let paths = CircuitPaths::new(Some(Path::new("/tmp/circuit-test")));

        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/circuit-test/config.toml")
        );
        assert_eq!(
            paths.sessions_dir().unwrap(),
            PathBuf::from("/tmp/circuit-test/sessions")
        );
        assert_eq!(
            paths.templates_dir().unwrap(),
            PathBuf::from("/tmp/circuit-test/templates")
        );
    }

    #[test]
    fn test_data_dir_override_keeps_config_dir() {
        let paths = CircuitPaths::new(Some(Path::new("/etc/circuit")))
            .with_data_dir(Some(PathBuf::from("/srv/circuit")));

        assert_eq!(paths.config_dir().unwrap(), PathBuf::from("/etc/circuit"));
        assert_eq!(
            paths.sessions_dir().unwrap(),
            PathBuf::from("/srv/circuit/sessions")
        );

        let unchanged = paths.clone().with_data_dir(None);
        assert_eq!(unchanged.data_dir().unwrap(), PathBuf::from("/srv/circuit"));
    }

    #[test]
    fn test_platform_dirs_end_with_app_name() {
        let paths = CircuitPaths::default();
        if let Ok(config_dir) = paths.config_dir() {
            assert!(config_dir.ends_with("circuit"));
        }
        if let Ok(data_dir) = paths.data_dir() {
            assert!(data_dir.ends_with("circuit"));
        }
    }
}
