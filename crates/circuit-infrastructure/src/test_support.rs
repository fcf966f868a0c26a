//! Fixtures shared by the store tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use circuit_core::session::{Session, transition};
use circuit_core::template::{Block, Step, StepKind, Template, TemplateSnapshot};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 2, 7, 0, 0).unwrap()
}

pub fn sample_snapshot() -> TemplateSnapshot {
    let template = Template {
        id: "tpl-sample".to_string(),
        name: "Sample".to_string(),
        blocks: vec![Block {
            name: "Main".to_string(),
            block_mode: None,
            block_duration_seconds: None,
            block_sets: None,
            block_rest_seconds: None,
            steps: vec![
                Step {
                    title: "Bike".to_string(),
                    step_kind: StepKind::Time,
                    duration_ms: Some(60_000),
                    reps: None,
                    exercise_id: None,
                },
                Step {
                    title: "Push-ups".to_string(),
                    step_kind: StepKind::Reps,
                    duration_ms: None,
                    reps: Some(10),
                    exercise_id: None,
                },
            ],
        }],
    };
    TemplateSnapshot::resolve(&template).unwrap()
}

/// A freshly started session (version 1) created `offset_secs` after the base time.
pub fn sample_session(id: &str, gym_id: &str, offset_secs: i64) -> Session {
    transition::start(
        id,
        gym_id,
        sample_snapshot(),
        base_time() + Duration::seconds(offset_secs),
    )
    .unwrap()
}
