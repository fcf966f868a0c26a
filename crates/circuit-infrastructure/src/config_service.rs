//! Configuration service implementation.
//!
//! Loads `CircuitConfig` from `config.toml` in the config directory,
//! writing the defaults on first use.

use crate::paths::CircuitPaths;
use crate::storage::AtomicTomlFile;
use circuit_core::config::CircuitConfig;
use circuit_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<CircuitConfig>>>,
}

impl ConfigService {
    /// Creates a service for the config file resolved by `paths`.
    ///
    /// Nothing is read until the first access.
    pub fn new(paths: &CircuitPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A config file that cannot be read or parsed falls back to the
    /// defaults (and is not cached, so a fixed file is picked up).
    pub fn get_config(&self) -> CircuitConfig {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return cached.clone();
        }

        match self.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config from {:?}: {}", self.path, e);
                CircuitConfig::default()
            }
        }
    }

    /// Loads the configuration from disk, creating the file with defaults
    /// if it is missing, and refreshes the cache.
    pub fn load(&self) -> Result<CircuitConfig> {
        let file = AtomicTomlFile::<CircuitConfig>::new(self.path.clone());
        let loaded = match file.load()? {
            Some(config) => config,
            None => {
                let defaults = CircuitConfig::default();
                file.save(&defaults)?;
                tracing::debug!("Wrote default config to {:?}", self.path);
                defaults
            }
        };

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Applies `f` to the stored configuration and persists it under the
    /// file lock.
    pub fn update<F>(&self, f: F) -> Result<CircuitConfig>
    where
        F: FnOnce(&mut CircuitConfig),
    {
        let file = AtomicTomlFile::<CircuitConfig>::new(self.path.clone());
        let updated = file.update(CircuitConfig::default(), |config| {
            f(config);
            Ok(config.clone())
        })?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = Some(updated.clone());
        Ok(updated)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(&CircuitPaths::new(Some(temp_dir.path()))).unwrap();

        let config = service.get_config();

        assert_eq!(config, CircuitConfig::default());
        assert!(temp_dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_cache_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = 500\n").unwrap();
        let service = ConfigService::with_path(path.clone());

        assert_eq!(service.get_config().poll_interval_ms, 500);

        std::fs::write(&path, "poll_interval_ms = 250\n").unwrap();
        assert_eq!(service.get_config().poll_interval_ms, 500);

        service.invalidate_cache();
        assert_eq!(service.get_config().poll_interval_ms, 250);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = \"soon\"\n").unwrap();
        let service = ConfigService::with_path(path);

        assert!(service.load().is_err());
        assert_eq!(service.get_config(), CircuitConfig::default());
    }

    #[test]
    fn test_update_persists() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        service
            .update(|config| config.log_level = "debug".to_string())
            .unwrap();

        let reloaded = ConfigService::with_path(service.path().clone());
        assert_eq!(reloaded.get_config().log_level, "debug");
    }
}
