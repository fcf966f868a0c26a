//! Session domain model.
//!
//! This module contains the `Session` aggregate: one live (or finished)
//! training run driven by a coach and watched by any number of displays.

use crate::error::{CircuitError, Result};
use crate::template::{BlockMode, BlockSnapshot, StepSnapshot, TemplateSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a session.
///
/// `Stopped` and `Ended` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    Paused,
    Stopped,
    Ended,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Ended)
    }

    /// Running or paused: the states navigation is allowed from.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
            Self::Ended => "ENDED",
        };
        f.write_str(label)
    }
}

/// The versioned record tracking one training run.
///
/// Deadlines are absolute instants so that every display can compute the
/// countdown locally from whatever copy it last polled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Scope (gym, room, screen group) the session runs in
    pub gym_id: String,
    pub status: SessionStatus,
    /// Mode of the current block, copied on every block/step change
    pub view_mode: BlockMode,
    pub current_block_index: usize,
    /// `Some` only when `view_mode` is follow-steps
    pub current_step_index: Option<usize>,
    pub step_end_time: Option<DateTime<Utc>>,
    pub block_end_time: Option<DateTime<Utc>>,
    /// Frozen countdown while paused
    pub remaining_ms: Option<u64>,
    /// Starts at 1 and grows by exactly 1 on every successful mutation
    pub state_version: u64,
    pub template_snapshot: TemplateSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn follows_steps(&self) -> bool {
        self.view_mode.is_follow_steps()
    }

    pub fn current_block(&self) -> Option<&BlockSnapshot> {
        self.template_snapshot.block(self.current_block_index)
    }

    pub fn current_step(&self) -> Option<&StepSnapshot> {
        let step_index = self.current_step_index?;
        self.template_snapshot
            .step(self.current_block_index, step_index)
    }

    /// The deadline relevant to the current view mode.
    pub fn active_deadline(&self) -> Option<DateTime<Utc>> {
        if self.follows_steps() {
            self.step_end_time
        } else {
            self.block_end_time
        }
    }

    /// Full timer length of the current step (follow-steps) or block.
    pub fn current_unit_duration(&self) -> Option<u64> {
        if self.follows_steps() {
            self.current_step().and_then(StepSnapshot::timed_duration)
        } else {
            self.current_block().and_then(BlockSnapshot::timed_duration)
        }
    }

    /// Verifies the structural invariants every stored session must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `Internal` describing the first violated invariant.
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |message: String| -> Result<()> {
            Err(CircuitError::internal(format!(
                "session '{}' is inconsistent: {}",
                self.id, message
            )))
        };

        if self.state_version == 0 {
            return fail("state_version must start at 1".to_string());
        }

        if let Err(e) = self.template_snapshot.validate() {
            return fail(e.to_string());
        }

        let Some(block) = self.current_block() else {
            return fail(format!(
                "block index {} out of range ({} blocks)",
                self.current_block_index,
                self.template_snapshot.blocks.len()
            ));
        };

        if self.view_mode != block.block_mode {
            return fail(format!(
                "view mode {} does not match block mode {}",
                self.view_mode, block.block_mode
            ));
        }

        match (self.follows_steps(), self.current_step_index) {
            (true, Some(step)) if step < block.steps.len() => {}
            (true, step) => {
                return fail(format!(
                    "step index {:?} invalid for block with {} steps",
                    step,
                    block.steps.len()
                ));
            }
            (false, Some(step)) => {
                return fail(format!("step index {step} set outside follow-steps mode"));
            }
            (false, None) => {}
        }

        match self.status {
            SessionStatus::Running => {
                if self.remaining_ms.is_some() {
                    return fail("remaining_ms set while running".to_string());
                }
                let stray = if self.follows_steps() {
                    self.block_end_time
                } else {
                    self.step_end_time
                };
                if stray.is_some() {
                    return fail("deadline set for the inactive timer".to_string());
                }
            }
            SessionStatus::Paused => {
                if self.step_end_time.is_some() || self.block_end_time.is_some() {
                    return fail("deadline set while paused".to_string());
                }
                if self.remaining_ms.is_none() {
                    return fail("remaining_ms missing while paused".to_string());
                }
            }
            SessionStatus::Stopped | SessionStatus::Ended => {
                if self.step_end_time.is_some()
                    || self.block_end_time.is_some()
                    || self.remaining_ms.is_some()
                {
                    return fail(format!("timer fields set on {} session", self.status));
                }
            }
        }

        Ok(())
    }
}
