//! In-memory SessionRepository implementation.
//!
//! Used by tests, simulations and single-process deployments where the
//! session record does not need to outlive the process.

use async_trait::async_trait;
use circuit_core::error::{CircuitError, Result};
use circuit_core::session::{Session, SessionRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session store backed by a `HashMap` behind a `tokio` `RwLock`.
///
/// The write lock is held across the version comparison and the swap, so
/// two concurrent `conditional_write` calls for the same record can never
/// both succeed.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, across all gyms.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn sort_recent_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn insert(&self, session: &Session) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session.id) {
            return Err(CircuitError::conflict(
                &session.id,
                session.state_version,
                existing.state_version,
            ));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(session.clone())
    }

    async fn conditional_write(&self, expected_version: u64, session: &Session) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&session.id)
            .ok_or_else(|| CircuitError::not_found("Session", &session.id))?;

        if stored.state_version != expected_version {
            return Err(CircuitError::conflict(
                &session.id,
                expected_version,
                stored.state_version,
            ));
        }

        *stored = session.clone();
        Ok(session.clone())
    }

    async fn find_current(&self, gym_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.gym_id == gym_id && s.status.is_live())
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn list_by_gym(&self, gym_id: &str) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.gym_id == gym_id)
            .cloned()
            .collect();
        sort_recent_first(&mut sessions);
        Ok(sessions)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
