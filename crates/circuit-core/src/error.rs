//! Error types for Circuit.

use crate::session::SessionStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every Circuit crate.
///
/// Variants fall into the groups callers care about: validation failures
/// (nothing was created), precondition failures (the session is left
/// untouched), staleness (`Conflict`), and infrastructure failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircuitError {
    // ============================================================================
    // Validation
    // ============================================================================
    /// The template cannot be frozen into a snapshot
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// The first block follows steps but has none
    #[error("The first block has no steps to follow")]
    EmptyFirstBlock,

    // ============================================================================
    // State preconditions
    // ============================================================================
    #[error("Session is not running (status: {status})")]
    NotRunning { status: SessionStatus },

    #[error("Session is not paused (status: {status})")]
    NotPaused { status: SessionStatus },

    /// A paused session without a frozen remaining duration
    #[error("Paused session has no remaining time recorded")]
    MissingRemaining,

    #[error("Operation not applicable: {reason}")]
    NotApplicable { reason: String },

    #[error("Already at the first step of the first block")]
    BeforeFirstStep,

    #[error("Already at the first block")]
    BeyondFirstBlock,

    #[error("Already at the last block")]
    BeyondLastBlock,

    /// Block navigation landed on a follow-steps block with no steps
    #[error("Block {block_index} has no steps to follow")]
    EmptyBlock { block_index: usize },

    // ============================================================================
    // Staleness
    // ============================================================================
    /// The stored record changed since the caller read it
    #[error("Version conflict on session '{session_id}': expected {expected}, found {actual}")]
    Conflict {
        session_id: String,
        expected: u64,
        actual: u64,
    },

    // ============================================================================
    // Lookup and infrastructure
    // ============================================================================
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Migration error: {0}")]
    Migration(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CircuitError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a NotApplicable error
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable {
            reason: reason.into(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(session_id: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::Conflict {
            session_id: session_id.into(),
            expected,
            actual,
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a Migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if the error was raised before any session existed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidTemplate(_) | Self::EmptyFirstBlock)
    }

    /// Check if the error is a state-precondition violation.
    ///
    /// These are user-facing: the session was left unchanged and the caller
    /// should show the message rather than retry.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotRunning { .. }
                | Self::NotPaused { .. }
                | Self::MissingRemaining
                | Self::NotApplicable { .. }
                | Self::BeforeFirstStep
                | Self::BeyondFirstBlock
                | Self::BeyondLastBlock
                | Self::EmptyBlock { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CircuitError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CircuitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CircuitError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CircuitError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for CircuitError {
    fn from(err: version_migrate::MigrationError) -> Self {
        use version_migrate::MigrationError;

        match err {
            MigrationError::EntityNotFound(id) => Self::not_found("entity", id),
            MigrationError::DeserializationError(_) | MigrationError::SerializationError(_) => {
                Self::Serialization {
                    format: "migration".to_string(),
                    message: err.to_string(),
                }
            }
            _ => Self::Migration(err.to_string()),
        }
    }
}

/// A type alias for `Result<T, CircuitError>`.
pub type Result<T> = std::result::Result<T, CircuitError>;
