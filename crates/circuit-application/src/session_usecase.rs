//! Session use case implementation.
//!
//! `SessionUseCase` is the caller-facing surface of Circuit: it resolves
//! templates, runs the pure transition engine against the stored record and
//! persists the result with a conditional write.

use crate::session::SessionUpdater;
use circuit_core::clock::Clock;
use circuit_core::error::{CircuitError, Result};
use circuit_core::session::{
    AutoAdvanceDecision, AutoAdvanceOutcome, Direction, NoOpReason, Session, SessionRepository,
    SessionStatus, SessionView, Transition, auto_advance, transition,
};
use circuit_core::template::{Template, TemplateProvider, TemplateSnapshot};
use std::sync::Arc;
use uuid::Uuid;

/// Where the structure of a new session comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Look the template up through the `TemplateProvider`
    Id(String),
    /// An ad-hoc template supplied by the caller; resolved like a stored one
    Template(Template),
    /// A snapshot the caller already resolved
    Snapshot(TemplateSnapshot),
}

/// Use case for running live sessions.
///
/// # Responsibilities
///
/// - Starting sessions from a template (freezing it into a snapshot)
/// - Manual navigation: pause, resume, stop, step and block moves
/// - Deadline-driven auto-advance, safe under many concurrent pollers
/// - Looking up the current session of a gym
///
/// # Concurrency
///
/// Every mutation is a single conditional write. Manual operations surface
/// `Conflict` so the caller can refresh and retry; auto-advance absorbs it.
pub struct SessionUseCase {
    /// Repository for session records
    session_repository: Arc<dyn SessionRepository>,
    /// Source of editable templates
    template_provider: Arc<dyn TemplateProvider>,
    clock: Arc<dyn Clock>,
    updater: SessionUpdater,
}

impl SessionUseCase {
    /// Creates a new `SessionUseCase` instance.
    pub fn new(
        session_repository: Arc<dyn SessionRepository>,
        template_provider: Arc<dyn TemplateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            updater: SessionUpdater::new(session_repository.clone(), clock.clone()),
            session_repository,
            template_provider,
            clock,
        }
    }

    pub fn repository(&self) -> Arc<dyn SessionRepository> {
        self.session_repository.clone()
    }

    /// Starts a new session in `gym_id`.
    ///
    /// The template is deep-copied into the session; later edits to the
    /// source template never reach a running session.
    ///
    /// # Errors
    ///
    /// - `NotFound` if a template ID does not resolve
    /// - `InvalidTemplate` / `EmptyFirstBlock` (nothing is stored)
    /// - Storage errors
    pub async fn start(&self, gym_id: &str, source: TemplateSource) -> Result<Session> {
        tracing::info!("[SessionUseCase] Starting session in gym: {}", gym_id);

        let snapshot = match source {
            TemplateSource::Snapshot(snapshot) => snapshot,
            TemplateSource::Template(template) => TemplateSnapshot::resolve(&template)?,
            TemplateSource::Id(template_id) => {
                let template = self
                    .template_provider
                    .get_template(&template_id)
                    .await?
                    .ok_or_else(|| CircuitError::not_found("Template", &template_id))?;
                TemplateSnapshot::resolve(&template)?
            }
        };

        let session_id = Uuid::new_v4().to_string();
        tracing::debug!("[SessionUseCase] Generated session ID: {}", session_id);

        let session = transition::start(session_id, gym_id, snapshot, self.clock.now())?;
        let session = self.session_repository.insert(&session).await?;

        tracing::info!(
            "[SessionUseCase] Session {} started: template={}, blocks={}",
            session.id,
            session.template_snapshot.name,
            session.template_snapshot.blocks.len()
        );

        Ok(session)
    }

    /// Applies a manual transition with read → decide → conditional write.
    pub async fn transition(&self, session_id: &str, change: Transition) -> Result<Session> {
        let session = self
            .updater
            .update(session_id, change.name(), |session, now| {
                transition::apply(session, change, now)
            })
            .await?;

        if matches!(change, Transition::Stop | Transition::Step(_)) {
            log_terminal(&session);
        }
        Ok(session)
    }

    pub async fn pause(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Pause).await
    }

    pub async fn resume(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Resume).await
    }

    /// Stops a session. Stopping a finished session returns it unchanged.
    pub async fn stop(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Stop).await
    }

    pub async fn next_step(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Step(Direction::Forward))
            .await
    }

    pub async fn prev_step(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Step(Direction::Backward))
            .await
    }

    pub async fn next_block(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Block(Direction::Forward))
            .await
    }

    pub async fn prev_block(&self, session_id: &str) -> Result<Session> {
        self.transition(session_id, Transition::Block(Direction::Backward))
            .await
    }

    /// Advances the session if its active deadline has passed and the
    /// caller's `expected_version` is still current.
    ///
    /// Losing a race is not an error: the caller gets `NoOp` with reason
    /// `Stale` and the record as it now stands.
    pub async fn auto_advance_check(
        &self,
        session_id: &str,
        expected_version: u64,
    ) -> Result<AutoAdvanceOutcome> {
        let session = self.get(session_id).await?;
        let now = self.clock.now();

        let deadline = match auto_advance::evaluate(&session, expected_version, now) {
            AutoAdvanceDecision::Skip(reason) => {
                tracing::trace!(
                    "[AutoAdvance] Session {} not advanced: {:?} (expected v{}, stored v{})",
                    session.id,
                    reason,
                    expected_version,
                    session.state_version
                );
                return Ok(AutoAdvanceOutcome::NoOp { session, reason });
            }
            AutoAdvanceDecision::Due { deadline } => deadline,
        };

        let next = transition::expire(&session, now)?;
        match self
            .session_repository
            .conditional_write(expected_version, &next)
            .await
        {
            Ok(written) => {
                tracing::debug!(
                    "[AutoAdvance] Session {} advanced past deadline {} (v{} -> v{})",
                    written.id,
                    deadline.to_rfc3339(),
                    expected_version,
                    written.state_version
                );
                log_terminal(&written);
                Ok(AutoAdvanceOutcome::Advanced { session: written })
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(
                    "[AutoAdvance] Session {} already advanced by another client",
                    session_id
                );
                let current = self.get(session_id).await?;
                Ok(AutoAdvanceOutcome::NoOp {
                    session: current,
                    reason: NoOpReason::Stale,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the most recent running or paused session of a gym.
    pub async fn get_current(&self, gym_id: &str) -> Result<Option<Session>> {
        self.session_repository.find_current(gym_id).await
    }

    pub async fn find(&self, session_id: &str) -> Result<Option<Session>> {
        self.session_repository.find_by_id(session_id).await
    }

    /// Gets a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session doesn't exist.
    pub async fn get(&self, session_id: &str) -> Result<Session> {
        self.session_repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| CircuitError::not_found("Session", session_id))
    }

    pub async fn list(&self, gym_id: &str) -> Result<Vec<Session>> {
        self.session_repository.list_by_gym(gym_id).await
    }

    /// Projects a session for display at the current clock time.
    pub fn project(&self, session: &Session) -> SessionView {
        SessionView::at(session, self.clock.now())
    }
}

fn log_terminal(session: &Session) {
    match session.status {
        SessionStatus::Ended => {
            tracing::info!("[SessionUseCase] Session {} ended", session.id);
        }
        SessionStatus::Stopped => {
            tracing::info!("[SessionUseCase] Session {} stopped", session.id);
        }
        SessionStatus::Running | SessionStatus::Paused => {}
    }
}

#[cfg(test)]
#[path = "session_usecase_test.rs"]
mod tests;
