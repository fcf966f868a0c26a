//! Per-client auto-advance timer.
//!
//! Each connected coach client runs one of these. Any number of them may
//! race on the same session; the conditional write in
//! `SessionUseCase::auto_advance_check` lets exactly one win each deadline.

use crate::session_usecase::SessionUseCase;
use circuit_core::config::CircuitConfig;
use circuit_core::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

pub struct AutoAdvanceTicker {
    usecase: Arc<SessionUseCase>,
    interval: Duration,
}

impl AutoAdvanceTicker {
    pub fn new(usecase: Arc<SessionUseCase>, interval: Duration) -> Self {
        Self { usecase, interval }
    }

    pub fn from_config(usecase: Arc<SessionUseCase>, config: &CircuitConfig) -> Self {
        Self::new(
            usecase,
            Duration::from_millis(config.auto_advance_interval_ms.max(1)),
        )
    }

    /// Runs checks against `session_id` until the session is finished,
    /// disappears, or `cancel` fires.
    ///
    /// Each check passes the version this ticker last observed. The task
    /// resolves to the last record it saw.
    pub fn spawn(self, session_id: String, cancel: CancellationToken) -> JoinHandle<Option<Session>> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_seen: Option<Session> = None;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("[AutoAdvanceTicker] Cancelled for session {}", session_id);
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let expected_version = match &last_seen {
                    Some(session) => session.state_version,
                    None => match self.usecase.find(&session_id).await {
                        Ok(Some(session)) => session.state_version,
                        Ok(None) => {
                            tracing::warn!("[AutoAdvanceTicker] Session {} not found", session_id);
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "[AutoAdvanceTicker] Failed to read session {}: {}",
                                session_id,
                                e
                            );
                            continue;
                        }
                    },
                };

                match self
                    .usecase
                    .auto_advance_check(&session_id, expected_version)
                    .await
                {
                    Ok(outcome) => {
                        let session = outcome.into_session();
                        let finished = session.is_terminal();
                        last_seen = Some(session);
                        if finished {
                            tracing::debug!(
                                "[AutoAdvanceTicker] Session {} finished; stopping",
                                session_id
                            );
                            break;
                        }
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::warn!("[AutoAdvanceTicker] Session {} disappeared", session_id);
                        break;
                    }
                    Err(e) => {
                        // Retry on the next tick with the same version
                        tracing::warn!(
                            "[AutoAdvanceTicker] Check failed for session {}: {}",
                            session_id,
                            e
                        );
                    }
                }
            }

            last_seen
        })
    }
}
