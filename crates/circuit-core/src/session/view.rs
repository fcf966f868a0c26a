//! Display projection of a session.
//!
//! Displays never receive a pushed countdown. They poll the record and
//! recompute the remaining time from the absolute deadline against their
//! own clock, so the poll interval and the timer resolution stay decoupled.

use super::model::{Session, SessionStatus};
use super::transition::remaining_until;
use crate::template::{BlockMode, StepKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a display screen renders for a session at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub status: SessionStatus,
    pub view_mode: BlockMode,
    pub block_index: usize,
    pub block_count: usize,
    pub block_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    pub step_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_kind: Option<StepKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    /// Countdown at the projection instant; `None` when nothing is ticking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step_title: Option<String>,
    pub state_version: u64,
}

impl SessionView {
    /// Projects `session` as seen at `now`.
    pub fn at(session: &Session, now: DateTime<Utc>) -> Self {
        let block = session.current_block();
        let step = session.current_step();

        let deadline = match session.status {
            SessionStatus::Running => session.active_deadline(),
            _ => None,
        };
        let remaining_ms = match session.status {
            SessionStatus::Running => deadline.map(|deadline| remaining_until(deadline, now)),
            SessionStatus::Paused => session
                .current_unit_duration()
                .and(session.remaining_ms),
            SessionStatus::Stopped | SessionStatus::Ended => None,
        };

        Self {
            session_id: session.id.clone(),
            status: session.status,
            view_mode: session.view_mode,
            block_index: session.current_block_index,
            block_count: session.template_snapshot.blocks.len(),
            block_name: block.map(|b| b.name.clone()).unwrap_or_default(),
            step_index: session.current_step_index,
            step_count: block.map_or(0, |b| b.steps.len()),
            step_title: step.map(|s| s.title.clone()),
            step_kind: step.map(|s| s.step_kind),
            reps: step.and_then(|s| s.reps),
            remaining_ms,
            deadline,
            next_step_title: next_step_title(session),
            state_version: session.state_version,
        }
    }
}

/// Title of the step that follows the current one, within or across blocks.
fn next_step_title(session: &Session) -> Option<String> {
    if session.is_terminal() {
        return None;
    }
    let snapshot = &session.template_snapshot;
    let block_index = session.current_block_index;

    if let Some(step_index) = session.current_step_index
        && let Some(step) = snapshot.step(block_index, step_index + 1)
    {
        return Some(step.title.clone());
    }

    snapshot
        .blocks
        .iter()
        .skip(block_index + 1)
        .find(|block| block.is_landable())
        .map(|block| {
            block
                .steps
                .first()
                .map(|s| s.title.clone())
                .unwrap_or_else(|| block.name.clone())
        })
}
