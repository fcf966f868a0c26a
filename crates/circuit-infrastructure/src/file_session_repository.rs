//! File-based SessionRepository implementation.
//!
//! One JSON document per session, written through the versioned DTO so
//! records written today still load after the schema moves on.
//!
//! Directory structure:
//! ```text
//! data_dir/
//! └── sessions/
//!     ├── <session-id>.json
//!     └── <session-id>.lock
//! ```

use crate::dto::{SESSION_ENTITY, create_session_migrator};
use crate::storage::{FileLock, read_optional, write_atomic};
use async_trait::async_trait;
use circuit_core::error::{CircuitError, Result};
use circuit_core::session::{Session, SessionRepository};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::task;

const SESSION_EXTENSION: &str = "json";

/// Session store keeping one JSON file per session.
///
/// Every compare-and-swap runs under an exclusive lock on the session's
/// `.lock` file, so separate processes sharing the directory (several coach
/// clients, a CLI) see a single winner per version.
#[derive(Debug, Clone)]
pub struct FileSessionRepository {
    sessions_dir: PathBuf,
}

impl FileSessionRepository {
    /// Creates a repository rooted at `sessions_dir`, creating it if needed.
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Result<Self> {
        let sessions_dir = sessions_dir.into();
        fs::create_dir_all(&sessions_dir).map_err(|e| {
            CircuitError::io(format!(
                "Failed to create sessions directory '{}': {}",
                sessions_dir.display(),
                e
            ))
        })?;
        Ok(Self { sessions_dir })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        // IDs become file names; refuse anything that could escape the directory
        if session_id.is_empty()
            || session_id
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(CircuitError::data_access(format!(
                "Invalid session id '{}'",
                session_id
            )));
        }
        Ok(self
            .sessions_dir
            .join(format!("{}.{}", session_id, SESSION_EXTENSION)))
    }

    /// Loads a session file synchronously.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: File exists and was migrated to the domain model
    /// - `Ok(None)`: File doesn't exist
    /// - `Err`: Error reading or migrating the file
    fn load_sync(path: &Path) -> Result<Option<Session>> {
        let Some(json_str) = read_optional(path)? else {
            return Ok(None);
        };

        let json_value: serde_json::Value = serde_json::from_str(&json_str).map_err(|e| {
            CircuitError::Serialization {
                format: "json".to_string(),
                message: format!("Failed to parse session file '{}': {}", path.display(), e),
            }
        })?;

        let migrator = create_session_migrator()?;
        let session: Session = migrator
            .load_flat_from(SESSION_ENTITY, json_value)
            .map_err(|e| {
                CircuitError::migration(format!(
                    "Failed to migrate session from '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        // Hand-edited records are rejected here rather than mid-transition
        session.check_invariants().map_err(|e| {
            CircuitError::data_access(format!(
                "Session file '{}' failed validation: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(session))
    }

    /// Serializes the session with its schema version and writes it atomically.
    fn save_sync(path: &Path, session: &Session) -> Result<()> {
        let migrator = create_session_migrator()?;
        let json_str = migrator
            .save_domain_flat(SESSION_ENTITY, session)
            .map_err(|e| CircuitError::Serialization {
                format: "json".to_string(),
                message: format!("Failed to serialize session: {}", e),
            })?;

        write_atomic(path, &json_str)
    }

    fn insert_sync(path: &Path, session: &Session) -> Result<()> {
        let _lock = FileLock::acquire(path)?;

        if let Some(existing) = Self::load_sync(path)? {
            return Err(CircuitError::conflict(
                &session.id,
                session.state_version,
                existing.state_version,
            ));
        }

        Self::save_sync(path, session)
    }

    fn conditional_write_sync(path: &Path, expected_version: u64, session: &Session) -> Result<()> {
        let _lock = FileLock::acquire(path)?;

        let stored = Self::load_sync(path)?
            .ok_or_else(|| CircuitError::not_found("Session", &session.id))?;

        if stored.state_version != expected_version {
            return Err(CircuitError::conflict(
                &session.id,
                expected_version,
                stored.state_version,
            ));
        }

        Self::save_sync(path, session)
    }

    /// Loads every session file in the directory.
    ///
    /// Files that fail to load are skipped with a warning so one corrupt
    /// record cannot hide a gym's live session.
    fn load_all_sync(dir: &Path) -> Result<Vec<Session>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SESSION_EXTENSION) {
                continue;
            }
            match Self::load_sync(&path) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable session file {:?}: {}", path, e);
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let dir = self.sessions_dir.clone();
        task::spawn_blocking(move || Self::load_all_sync(&dir))
            .await
            .map_err(|e| CircuitError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let path = self.session_path(session_id)?;

        task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .map_err(|e| CircuitError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn insert(&self, session: &Session) -> Result<Session> {
        let path = self.session_path(&session.id)?;
        let session = session.clone();

        task::spawn_blocking(move || {
            Self::insert_sync(&path, &session)?;
            Ok(session)
        })
        .await
        .map_err(|e| CircuitError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn conditional_write(&self, expected_version: u64, session: &Session) -> Result<Session> {
        let path = self.session_path(&session.id)?;
        let session = session.clone();

        task::spawn_blocking(move || {
            Self::conditional_write_sync(&path, expected_version, &session)?;
            Ok(session)
        })
        .await
        .map_err(|e| CircuitError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn find_current(&self, gym_id: &str) -> Result<Option<Session>> {
        // list_all is already most recent first
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|s| s.gym_id == gym_id && s.status.is_live()))
    }

    async fn list_by_gym(&self, gym_id: &str) -> Result<Vec<Session>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|s| s.gym_id == gym_id)
            .collect())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id)?;

        task::spawn_blocking(move || {
            let _lock = FileLock::acquire(&path)?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CircuitError::data_access(format!(
                    "Failed to delete session file '{}': {}",
                    path.display(),
                    e
                ))),
            }
        })
        .await
        .map_err(|e| CircuitError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_session;
    use chrono::Duration;
    use circuit_core::session::{SessionStatus, transition};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_repository() -> (FileSessionRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path().join("sessions")).unwrap();
        (repo, temp_dir)
    }

    #[tokio::test]
    async fn test_insert_and_find_session() {
        let (repo, _temp_dir) = create_test_repository();
        let session = sample_session("550e8400-e29b-41d4-a716-446655440000", "gym-a", 0);

        repo.insert(&session).await.unwrap();

        let found = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(found, session);
    }

    #[tokio::test]
    async fn test_file_carries_schema_version_and_absolute_deadline() {
        let (repo, _temp_dir) = create_test_repository();
        let session = sample_session("s-json", "gym-a", 0);
        repo.insert(&session).await.unwrap();

        let raw = fs::read_to_string(repo.sessions_dir().join("s-json.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["state_version"], 1);
        assert_eq!(value["status"], "RUNNING");
        let deadline = value["step_end_time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(deadline).is_ok());
    }

    #[tokio::test]
    async fn test_find_nonexistent_session() {
        let (repo, _temp_dir) = create_test_repository();
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let (repo, _temp_dir) = create_test_repository();
        assert!(repo.find_by_id("../escape").await.is_err());
        assert!(repo.find_by_id("").await.is_err());
    }

    #[tokio::test]
    async fn test_insert_twice_conflicts() {
        let (repo, _temp_dir) = create_test_repository();
        let session = sample_session("dup", "gym-a", 0);
        repo.insert(&session).await.unwrap();

        assert!(repo.insert(&session).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_conditional_write_compares_versions() {
        let (repo, _temp_dir) = create_test_repository();
        let session = sample_session("s-1", "gym-a", 0);
        repo.insert(&session).await.unwrap();

        let paused = transition::pause(&session, session.created_at).unwrap();
        repo.conditional_write(1, &paused).await.unwrap();

        let stale = transition::stop(&session, session.created_at).unwrap().unwrap();
        let err = repo.conditional_write(1, &stale).await.unwrap_err();
        assert_eq!(err, CircuitError::conflict("s-1", 1, 2));

        let stored = repo.find_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Paused);
        assert_eq!(stored.state_version, 2);
    }

    #[tokio::test]
    async fn test_conditional_write_missing_session() {
        let (repo, _temp_dir) = create_test_repository();
        let session = sample_session("ghost", "gym-a", 0);

        assert!(repo.conditional_write(1, &session).await.unwrap_err().is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conditional_writes_single_winner() {
        let (repo, _temp_dir) = create_test_repository();
        let repo = Arc::new(repo);
        let session = sample_session("race", "gym-a", 0);
        repo.insert(&session).await.unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let session = session.clone();
                tokio::spawn(async move {
                    let paused = transition::pause(&session, session.created_at).unwrap();
                    repo.conditional_write(1, &paused).await
                })
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) if e.is_conflict() => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 5);
    }

    #[tokio::test]
    async fn test_find_current_and_list_by_gym() {
        let (repo, _temp_dir) = create_test_repository();
        let older = sample_session("older", "gym-a", 0);
        let newer = sample_session("newer", "gym-a", 300);
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();
        repo.insert(&sample_session("elsewhere", "gym-b", 600))
            .await
            .unwrap();

        assert_eq!(repo.find_current("gym-a").await.unwrap().unwrap().id, "newer");

        let ended = transition::stop(&newer, newer.created_at + Duration::minutes(1))
            .unwrap()
            .unwrap();
        repo.conditional_write(1, &ended).await.unwrap();
        assert_eq!(repo.find_current("gym-a").await.unwrap().unwrap().id, "older");

        let ids: Vec<_> = repo
            .list_by_gym("gym-a")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["newer".to_string(), "older".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_skipped_when_listing() {
        let (repo, _temp_dir) = create_test_repository();
        repo.insert(&sample_session("good", "gym-a", 0)).await.unwrap();
        fs::write(repo.sessions_dir().join("bad.json"), "{ not json").unwrap();

        let listed = repo.list_by_gym("gym-a").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(repo.find_by_id("bad").await.is_err());
    }

    #[tokio::test]
    async fn test_inconsistent_record_is_rejected_on_load() {
        let (repo, _temp_dir) = create_test_repository();
        repo.insert(&sample_session("edited", "gym-a", 0)).await.unwrap();
        repo.insert(&sample_session("intact", "gym-a", 10)).await.unwrap();

        let path = repo.sessions_dir().join("edited.json");
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["current_block_index"] = serde_json::json!(99);
        fs::write(&path, value.to_string()).unwrap();

        let err = repo.find_by_id("edited").await.unwrap_err();
        assert!(matches!(err, CircuitError::DataAccess(ref m) if m.contains("edited.json")));

        // Writes against the broken record fail instead of overwriting it
        let next = sample_session("edited", "gym-a", 0);
        assert!(repo.conditional_write(1, &next).await.is_err());

        let listed = repo.list_by_gym("gym-a").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "intact");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (repo, _temp_dir) = create_test_repository();
        let session = sample_session("gone", "gym-a", 0);
        repo.insert(&session).await.unwrap();

        repo.delete("gone").await.unwrap();
        assert!(repo.find_by_id("gone").await.unwrap().is_none());

        // Deleting again is fine
        repo.delete("gone").await.unwrap();
    }
}
