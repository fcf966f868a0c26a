//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract, versioned store of session records.
///
/// One record per session ID. The transition engine never writes
/// unconditionally: every mutation goes through [`conditional_write`],
/// which is the only concurrency control sessions need.
///
/// # Implementation Notes
///
/// Implementations must make the version comparison and the write a
/// single atomic step per session ID. No cross-session coordination is
/// required.
///
/// [`conditional_write`]: SessionRepository::conditional_write
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Stores a brand-new session.
    ///
    /// # Errors
    ///
    /// - `Conflict` if a session with the same ID already exists
    /// - Storage errors
    async fn insert(&self, session: &Session) -> Result<Session>;

    /// Replaces the stored session only if its version is still
    /// `expected_version`.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the stored version differs
    /// - `NotFound` if the session does not exist
    /// - Storage errors
    async fn conditional_write(&self, expected_version: u64, session: &Session) -> Result<Session>;

    /// Returns the most recently created running or paused session in a
    /// gym, if any.
    async fn find_current(&self, gym_id: &str) -> Result<Option<Session>>;

    /// Lists all sessions of a gym, most recently created first.
    async fn list_by_gym(&self, gym_id: &str) -> Result<Vec<Session>>;

    /// Removes a session record. Archival policy lives with the caller;
    /// the transition engine never deletes.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Session deleted successfully (or didn't exist)
    /// - `Err(_)`: Error occurred during deletion
    async fn delete(&self, session_id: &str) -> Result<()>;
}
