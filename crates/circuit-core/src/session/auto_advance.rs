//! Deadline-driven auto-advance decisions.
//!
//! Many pollers (one per connected coach client) evaluate the same session
//! roughly once a second. Each carries the `state_version` it last saw;
//! only a caller whose version still matches may perform the advance, and
//! the store's conditional write guarantees at most one of them succeeds.

use super::model::{Session, SessionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an auto-advance check did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// Someone else mutated the session since the caller last looked
    Stale,
    NotRunning,
    /// The current step or block has no timer
    Untimed,
    NotDue,
}

/// What a poller should do with a session it just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoAdvanceDecision {
    Skip(NoOpReason),
    /// The active deadline has passed; advance now
    Due { deadline: DateTime<Utc> },
}

/// Result of an auto-advance check as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutoAdvanceOutcome {
    /// This caller performed the transition
    Advanced { session: Session },
    /// Nothing happened; `session` is the current record
    NoOp { session: Session, reason: NoOpReason },
}

impl AutoAdvanceOutcome {
    pub fn session(&self) -> &Session {
        match self {
            Self::Advanced { session } | Self::NoOp { session, .. } => session,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Self::Advanced { session } | Self::NoOp { session, .. } => session,
        }
    }

    pub fn advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Decides whether `session` should auto-advance at `now`.
///
/// Checks run in order: version, status, presence of a deadline, and
/// whether the deadline has passed.
pub fn evaluate(session: &Session, expected_version: u64, now: DateTime<Utc>) -> AutoAdvanceDecision {
    if session.state_version != expected_version {
        return AutoAdvanceDecision::Skip(NoOpReason::Stale);
    }
    if session.status != SessionStatus::Running {
        return AutoAdvanceDecision::Skip(NoOpReason::NotRunning);
    }
    let Some(deadline) = session.active_deadline() else {
        return AutoAdvanceDecision::Skip(NoOpReason::Untimed);
    };
    if now < deadline {
        return AutoAdvanceDecision::Skip(NoOpReason::NotDue);
    }
    AutoAdvanceDecision::Due { deadline }
}
