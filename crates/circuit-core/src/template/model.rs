//! Editable workout template model.
//!
//! Templates are owned by the content library and may change at any time.
//! Sessions never hold them directly; see [`super::TemplateSnapshot`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a block is driven on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMode {
    /// Navigate step by step, each step with its own timer
    #[default]
    FollowSteps,
    Amrap,
    Emom,
    ForTime,
    StrengthSets,
}

impl BlockMode {
    pub fn is_follow_steps(self) -> bool {
        matches!(self, Self::FollowSteps)
    }
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FollowSteps => "follow_steps",
            Self::Amrap => "amrap",
            Self::Emom => "emom",
            Self::ForTime => "for_time",
            Self::StrengthSets => "strength_sets",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    #[default]
    Note,
    Reps,
    Time,
    Load,
}

/// A workout template as edited in the content library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// File-backed providers fill this from the file name when absent
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// A named group of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    /// Falls back to `follow_steps` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_mode: Option<BlockMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_rest_seconds: Option<u64>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// The smallest schedulable unit of a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    #[serde(default)]
    pub step_kind: StepKind,
    /// Milliseconds; only meaningful for `StepKind::Time`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Only meaningful for `StepKind::Reps`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    /// Opaque reference into the exercise library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
}
