//! Infrastructure layer for Circuit.
//!
//! Stores for session records, template providers, path resolution and
//! the configuration service.

pub mod config_service;
pub mod dto;
pub mod file_session_repository;
pub mod memory_session_repository;
pub mod paths;
pub mod storage;
pub mod template_provider;

#[cfg(test)]
mod test_support;

pub use crate::config_service::ConfigService;
pub use crate::file_session_repository::FileSessionRepository;
pub use crate::memory_session_repository::InMemorySessionRepository;
pub use crate::paths::CircuitPaths;
pub use crate::template_provider::{InMemoryTemplateProvider, TomlTemplateProvider};
