//! Session updater helper for the read → decide → conditional-write pattern.
//!
//! Every manual mutation goes through `SessionUpdater`, so no caller can
//! write a session without proving it saw the latest version.

use chrono::{DateTime, Utc};
use circuit_core::clock::Clock;
use circuit_core::error::{CircuitError, Result};
use circuit_core::session::{Session, SessionRepository};
use std::sync::Arc;

/// Helper struct for updating sessions with optimistic concurrency.
///
/// `SessionUpdater` encapsulates:
/// 1. Loading a session from storage
/// 2. Running a pure decision against it at the current clock time
/// 3. Writing the result only if the stored version is unchanged
pub struct SessionUpdater {
    repository: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl SessionUpdater {
    pub fn new(repository: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Applies `decide` to the current record of `session_id`.
    ///
    /// `decide` returns `Ok(None)` for a no-op, in which case nothing is
    /// written and the current record is returned as-is.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session doesn't exist
    /// - Whatever `decide` returns (nothing is written)
    /// - `Conflict` if another writer got there first; the caller should
    ///   re-read and retry
    pub async fn update<F>(&self, session_id: &str, operation: &str, decide: F) -> Result<Session>
    where
        F: FnOnce(&Session, DateTime<Utc>) -> Result<Option<Session>>,
    {
        let session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| CircuitError::not_found("Session", session_id))?;

        tracing::debug!(
            "[SessionUpdater] {} on session {}: status={}, version={}",
            operation,
            session.id,
            session.status,
            session.state_version
        );

        let now = self.clock.now();
        let Some(next) = decide(&session, now)? else {
            tracing::debug!(
                "[SessionUpdater] {} is a no-op for session {}",
                operation,
                session.id
            );
            return Ok(session);
        };

        match self
            .repository
            .conditional_write(session.state_version, &next)
            .await
        {
            Ok(written) => {
                tracing::debug!(
                    "[SessionUpdater] {} saved session {}: version {} -> {}",
                    operation,
                    written.id,
                    session.state_version,
                    written.state_version
                );
                Ok(written)
            }
            Err(e) => {
                if e.is_conflict() {
                    tracing::warn!(
                        "[SessionUpdater] {} lost a race on session {}: {}",
                        operation,
                        session.id,
                        e
                    );
                }
                Err(e)
            }
        }
    }
}
