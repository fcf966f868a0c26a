//! Session transition engine.
//!
//! Pure decision logic: every function takes the current record and the
//! caller's notion of `now` and returns the next record. Nothing here
//! touches storage; the application layer wraps each call in a
//! version-checked write.

use super::model::{Session, SessionStatus};
use crate::error::{CircuitError, Result};
use crate::template::TemplateSnapshot;
use chrono::{DateTime, Utc};

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A manual operation a coach can apply to a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pause,
    Resume,
    Stop,
    Step(Direction),
    Block(Direction),
}

impl Transition {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Step(Direction::Forward) => "next_step",
            Self::Step(Direction::Backward) => "prev_step",
            Self::Block(Direction::Forward) => "next_block",
            Self::Block(Direction::Backward) => "prev_block",
        }
    }
}

/// Where a navigation walk lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    At {
        block_index: usize,
        step_index: Option<usize>,
    },
    /// Walked forward past the last step of the last block
    Finished,
}

/// Creates the first record of a session from a resolved snapshot.
///
/// # Errors
///
/// - `InvalidTemplate` if the snapshot has no blocks
/// - `EmptyFirstBlock` if the first block follows steps but has none
pub fn start(
    id: impl Into<String>,
    gym_id: impl Into<String>,
    template_snapshot: TemplateSnapshot,
    now: DateTime<Utc>,
) -> Result<Session> {
    template_snapshot.validate()?;
    let first = template_snapshot
        .block(0)
        .ok_or_else(|| CircuitError::InvalidTemplate("snapshot has no blocks".to_string()))?;

    if !first.is_landable() {
        return Err(CircuitError::EmptyFirstBlock);
    }

    let view_mode = first.block_mode;
    let mut session = Session {
        id: id.into(),
        gym_id: gym_id.into(),
        status: SessionStatus::Running,
        view_mode,
        current_block_index: 0,
        current_step_index: view_mode.is_follow_steps().then_some(0),
        step_end_time: None,
        block_end_time: None,
        remaining_ms: None,
        state_version: 1,
        template_snapshot,
        created_at: now,
        updated_at: now,
    };
    arm_timer(&mut session, now)?;

    Ok(session)
}

/// Applies a manual transition.
///
/// # Returns
///
/// - `Ok(Some(next))`: the session changed; `next.state_version` is one higher
/// - `Ok(None)`: the transition is a no-op (stopping a finished session)
/// - `Err(_)`: a precondition failed and the session must stay as it was
pub fn apply(session: &Session, transition: Transition, now: DateTime<Utc>) -> Result<Option<Session>> {
    match transition {
        Transition::Pause => pause(session, now).map(Some),
        Transition::Resume => resume(session, now).map(Some),
        Transition::Stop => stop(session, now),
        Transition::Step(direction) => advance_step(session, direction, now).map(Some),
        Transition::Block(direction) => advance_block(session, direction, now).map(Some),
    }
}

/// Freezes the active countdown.
pub fn pause(session: &Session, now: DateTime<Utc>) -> Result<Session> {
    if session.status != SessionStatus::Running {
        return Err(CircuitError::NotRunning {
            status: session.status,
        });
    }

    let remaining = session
        .active_deadline()
        .map(|deadline| remaining_until(deadline, now))
        .unwrap_or(0);

    let mut next = session.clone();
    next.step_end_time = None;
    next.block_end_time = None;
    next.remaining_ms = Some(remaining);
    next.status = SessionStatus::Paused;
    bump(&mut next, now);
    Ok(next)
}

/// Re-arms the frozen countdown from `now`.
///
/// An untimed step or block resumes without a deadline, even though the
/// paused record carries `remaining_ms = 0`.
pub fn resume(session: &Session, now: DateTime<Utc>) -> Result<Session> {
    if session.status != SessionStatus::Paused {
        return Err(CircuitError::NotPaused {
            status: session.status,
        });
    }
    let remaining = session.remaining_ms.ok_or(CircuitError::MissingRemaining)?;

    let mut next = session.clone();
    next.remaining_ms = None;
    next.status = SessionStatus::Running;
    if next.current_unit_duration().is_some() {
        let deadline = deadline_after(now, remaining)?;
        set_active_deadline(&mut next, Some(deadline));
    }
    bump(&mut next, now);
    Ok(next)
}

/// Stops the session from any state.
///
/// Stopping a session that already finished (stopped or ended) changes
/// nothing and returns `Ok(None)`; the version is not bumped.
pub fn stop(session: &Session, now: DateTime<Utc>) -> Result<Option<Session>> {
    if session.is_terminal() {
        return Ok(None);
    }

    let mut next = session.clone();
    next.status = SessionStatus::Stopped;
    clear_timers(&mut next);
    bump(&mut next, now);
    Ok(Some(next))
}

/// Moves one step forward or backward, crossing block boundaries.
///
/// Forward past the very last step ends the session. Landing on any step
/// restarts that step's full duration, in either direction.
///
/// # Errors
///
/// - `NotApplicable` unless the session is live and following steps
/// - `BeforeFirstStep` when walking back from the first step
pub fn advance_step(session: &Session, direction: Direction, now: DateTime<Utc>) -> Result<Session> {
    ensure_live(session, "step navigation")?;
    if !session.follows_steps() {
        return Err(CircuitError::not_applicable(format!(
            "step navigation needs a follow_steps block, current block is {}",
            session.view_mode
        )));
    }

    walk(session, direction, now)
}

/// Moves to the first step of the neighbouring block.
///
/// # Errors
///
/// - `NotApplicable` unless the session is live
/// - `BeyondFirstBlock` / `BeyondLastBlock` at either end (never ends the session)
/// - `EmptyBlock` if the target block follows steps but has none
pub fn advance_block(session: &Session, direction: Direction, now: DateTime<Utc>) -> Result<Session> {
    ensure_live(session, "block navigation")?;

    let current = session.current_block_index;
    let target = match direction {
        Direction::Forward => current + 1,
        Direction::Backward => current.checked_sub(1).ok_or(CircuitError::BeyondFirstBlock)?,
    };

    let block = session
        .template_snapshot
        .block(target)
        .ok_or(CircuitError::BeyondLastBlock)?;
    if !block.is_landable() {
        return Err(CircuitError::EmptyBlock {
            block_index: target,
        });
    }

    let step_index = block.block_mode.is_follow_steps().then_some(0);
    land(session, target, step_index, now)
}

/// Advances past an expired deadline.
///
/// Unlike [`advance_step`] this accepts block-granular views: an expired
/// block moves on to the next landable block, and the session ends after
/// the last one.
pub fn expire(session: &Session, now: DateTime<Utc>) -> Result<Session> {
    ensure_live(session, "auto-advance")?;
    walk(session, Direction::Forward, now)
}

fn walk(session: &Session, direction: Direction, now: DateTime<Utc>) -> Result<Session> {
    match next_landing(session, direction)? {
        Landing::At {
            block_index,
            step_index,
        } => land(session, block_index, step_index, now),
        Landing::Finished => {
            let mut next = session.clone();
            next.status = SessionStatus::Ended;
            clear_timers(&mut next);
            bump(&mut next, now);
            Ok(next)
        }
    }
}

fn next_landing(session: &Session, direction: Direction) -> Result<Landing> {
    let blocks = &session.template_snapshot.blocks;
    let block_index = session.current_block_index;

    if let Some(step_index) = session.current_step_index {
        let step_count = blocks.get(block_index).map_or(0, |b| b.steps.len());
        match direction {
            Direction::Forward if step_index + 1 < step_count => {
                return Ok(Landing::At {
                    block_index,
                    step_index: Some(step_index + 1),
                });
            }
            Direction::Backward if step_index > 0 => {
                return Ok(Landing::At {
                    block_index,
                    step_index: Some(step_index - 1),
                });
            }
            _ => {}
        }
    }

    // Crossing a block boundary; follow-steps blocks without steps are skipped.
    match direction {
        Direction::Forward => Ok(blocks
            .iter()
            .enumerate()
            .skip(block_index + 1)
            .find(|(_, block)| block.is_landable())
            .map(|(index, block)| Landing::At {
                block_index: index,
                step_index: block.block_mode.is_follow_steps().then_some(0),
            })
            .unwrap_or(Landing::Finished)),
        Direction::Backward => blocks[..block_index.min(blocks.len())]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, block)| block.is_landable())
            .map(|(index, block)| Landing::At {
                block_index: index,
                step_index: if block.block_mode.is_follow_steps() {
                    block.last_step_index()
                } else {
                    None
                },
            })
            .ok_or(CircuitError::BeforeFirstStep),
    }
}

/// Moves the pointers and restarts the full duration of the new unit.
fn land(
    session: &Session,
    block_index: usize,
    step_index: Option<usize>,
    now: DateTime<Utc>,
) -> Result<Session> {
    let block = session
        .template_snapshot
        .block(block_index)
        .ok_or_else(|| CircuitError::internal(format!("landing on missing block {block_index}")))?;

    let mut next = session.clone();
    next.view_mode = block.block_mode;
    next.current_block_index = block_index;
    next.current_step_index = step_index;
    arm_timer(&mut next, now)?;
    bump(&mut next, now);
    Ok(next)
}

/// Sets the timer fields for the current unit according to the status.
fn arm_timer(session: &mut Session, now: DateTime<Utc>) -> Result<()> {
    let duration = session.current_unit_duration();
    session.step_end_time = None;
    session.block_end_time = None;
    session.remaining_ms = None;

    match session.status {
        SessionStatus::Running => {
            let deadline = duration.map(|ms| deadline_after(now, ms)).transpose()?;
            set_active_deadline(session, deadline);
        }
        // Untimed units still carry a (zero) frozen countdown while paused.
        SessionStatus::Paused => session.remaining_ms = Some(duration.unwrap_or(0)),
        SessionStatus::Stopped | SessionStatus::Ended => {}
    }
    Ok(())
}

fn set_active_deadline(session: &mut Session, deadline: Option<DateTime<Utc>>) {
    if session.follows_steps() {
        session.step_end_time = deadline;
    } else {
        session.block_end_time = deadline;
    }
}

fn clear_timers(session: &mut Session) {
    session.step_end_time = None;
    session.block_end_time = None;
    session.remaining_ms = None;
}

fn bump(session: &mut Session, now: DateTime<Utc>) {
    session.state_version += 1;
    session.updated_at = now;
}

fn ensure_live(session: &Session, operation: &str) -> Result<()> {
    if session.status.is_live() {
        Ok(())
    } else {
        Err(CircuitError::not_applicable(format!(
            "{operation} on a {} session",
            session.status
        )))
    }
}

/// Milliseconds left until `deadline`, never negative.
pub fn remaining_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((deadline - now).num_milliseconds()).unwrap_or(0)
}

fn deadline_after(now: DateTime<Utc>, ms: u64) -> Result<DateTime<Utc>> {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| CircuitError::internal(format!("deadline {ms}ms after {now} overflows")))
}
