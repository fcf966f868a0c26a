//! Fixtures shared by the application tests.

use crate::session_usecase::SessionUseCase;
use chrono::{DateTime, TimeZone, Utc};
use circuit_core::clock::ManualClock;
use circuit_core::template::{Block, Step, StepKind, Template, TemplateSnapshot};
use circuit_infrastructure::{InMemorySessionRepository, InMemoryTemplateProvider};
use std::sync::Arc;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 20, 17, 0, 0).unwrap()
}

pub fn timed(title: &str, ms: u64) -> Step {
    Step {
        title: title.to_string(),
        step_kind: StepKind::Time,
        duration_ms: Some(ms),
        reps: None,
        exercise_id: None,
    }
}

pub fn follow(name: &str, steps: Vec<Step>) -> Block {
    Block {
        name: name.to_string(),
        block_mode: None,
        block_duration_seconds: None,
        block_sets: None,
        block_rest_seconds: None,
        steps,
    }
}

/// Block A = [A1 1000ms, A2 2000ms], block B = [B1 500ms].
pub fn two_block_template() -> Template {
    Template {
        id: "two-block".to_string(),
        name: "Two blocks".to_string(),
        blocks: vec![
            follow("A", vec![timed("A1", 1000), timed("A2", 2000)]),
            follow("B", vec![timed("B1", 500)]),
        ],
    }
}

pub fn two_block_snapshot() -> TemplateSnapshot {
    TemplateSnapshot::resolve(&two_block_template()).unwrap()
}

/// A use case over in-memory stores, with the clock at `t0()`.
pub fn usecase_with_clock() -> (Arc<SessionUseCase>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let templates = Arc::new(InMemoryTemplateProvider::with_templates([two_block_template()]));
    let usecase = SessionUseCase::new(
        Arc::new(InMemorySessionRepository::new()),
        templates,
        clock.clone(),
    );
    (Arc::new(usecase), clock)
}
