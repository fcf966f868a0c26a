pub mod session;
pub mod watch;

use anyhow::{Context, Result};
use circuit_application::SessionUseCase;
use circuit_core::clock::SystemClock;
use circuit_core::config::CircuitConfig;
use circuit_infrastructure::{CircuitPaths, ConfigService, FileSessionRepository, TomlTemplateProvider};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Resolves paths and loads `config.toml`, applying the data-dir overrides.
pub fn load_config(home: Option<&Path>) -> Result<(CircuitPaths, CircuitConfig)> {
    let paths = CircuitPaths::new(home);
    let config = ConfigService::new(&paths)
        .context("Failed to resolve config location")?
        .get_config();
    let paths = paths.with_config(&config);
    Ok((paths, config))
}

/// Everything a command needs, wired against the file store.
pub struct App {
    pub usecase: Arc<SessionUseCase>,
    pub config: CircuitConfig,
}

impl App {
    pub fn new(paths: CircuitPaths, config: CircuitConfig) -> Result<Self> {
        let sessions_dir = paths.sessions_dir()?;
        let templates_dir = paths.templates_dir()?;
        tracing::debug!(
            "Using sessions at {:?}, templates at {:?}",
            sessions_dir,
            templates_dir
        );

        let sessions = FileSessionRepository::new(sessions_dir)?;
        let templates = TomlTemplateProvider::new(templates_dir);
        let usecase = SessionUseCase::new(
            Arc::new(sessions),
            Arc::new(templates),
            Arc::new(SystemClock),
        );

        Ok(Self {
            usecase: Arc::new(usecase),
            config,
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
