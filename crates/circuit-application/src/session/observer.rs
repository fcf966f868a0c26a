//! Polling observer that republishes a session only when it changes.
//!
//! Displays never write. They poll the store, and subscribers are woken
//! only when the record's identity or `state_version` moves; the countdown
//! itself is recomputed locally from the absolute deadline.

use circuit_core::config::CircuitConfig;
use circuit_core::error::Result;
use circuit_core::session::{Session, SessionRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// What an observer follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveTarget {
    /// One session by ID
    Session(String),
    /// Whatever session is currently live in a gym
    Gym(String),
}

impl ObserveTarget {
    async fn fetch(&self, repository: &dyn SessionRepository) -> Result<Option<Session>> {
        match self {
            Self::Session(session_id) => repository.find_by_id(session_id).await,
            Self::Gym(gym_id) => repository.find_current(gym_id).await,
        }
    }
}

/// Identity of a published value: a new session or a new version is a change.
fn change_key(session: &Option<Session>) -> Option<(&str, u64)> {
    session.as_ref().map(|s| (s.id.as_str(), s.state_version))
}

/// Spawns polling tasks that feed `watch` channels.
#[derive(Clone)]
pub struct SessionObserver {
    repository: Arc<dyn SessionRepository>,
    poll_interval: Duration,
}

impl SessionObserver {
    pub fn new(repository: Arc<dyn SessionRepository>, poll_interval: Duration) -> Self {
        Self {
            repository,
            poll_interval,
        }
    }

    pub fn from_config(repository: Arc<dyn SessionRepository>, config: &CircuitConfig) -> Self {
        Self::new(repository, Duration::from_millis(config.poll_interval_ms.max(1)))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Starts polling `target` and returns the receiving end.
    ///
    /// The channel starts at `None`. Polling stops when `cancel` fires or
    /// every receiver is dropped; receivers then see the channel close.
    /// Store errors are logged and retried on the next tick.
    pub fn observe(
        &self,
        target: ObserveTarget,
        cancel: CancellationToken,
    ) -> watch::Receiver<Option<Session>> {
        let (tx, rx) = watch::channel(None);
        let repository = self.repository.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(
                "[SessionObserver] Observing {:?} every {:?}",
                target,
                poll_interval
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {}
                }

                match target.fetch(repository.as_ref()).await {
                    Ok(latest) => {
                        tx.send_if_modified(|current| {
                            if change_key(current) == change_key(&latest) {
                                return false;
                            }
                            *current = latest;
                            true
                        });
                    }
                    Err(e) => {
                        tracing::warn!("[SessionObserver] Poll of {:?} failed: {}", target, e);
                    }
                }
            }

            tracing::debug!("[SessionObserver] Stopped observing {:?}", target);
        });

        rx
    }
}
