//! Immutable template snapshots.
//!
//! A snapshot is taken once, when a session starts, and is owned by that
//! session alone. Every nested collection is copied so later edits to the
//! source template can never be observed through a running session.

use super::model::{Block, BlockMode, Step, StepKind, Template};
use crate::error::{CircuitError, Result};
use serde::{Deserialize, Serialize};

/// Frozen, self-contained copy of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    /// ID of the template this was resolved from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub name: String,
    pub blocks: Vec<BlockSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub name: String,
    #[serde(default)]
    pub block_mode: BlockMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_rest_seconds: Option<u64>,
    #[serde(default)]
    pub steps: Vec<StepSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub title: String,
    pub step_kind: StepKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
}

/// Longest step or block timer a template may declare (24 hours).
pub const MAX_TIMER_MS: u64 = 24 * 60 * 60 * 1000;

impl TemplateSnapshot {
    /// Freezes a template into an owned snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the template has no blocks or declares a
    /// timer longer than [`MAX_TIMER_MS`].
    pub fn resolve(template: &Template) -> Result<Self> {
        if template.blocks.is_empty() {
            return Err(CircuitError::InvalidTemplate(format!(
                "template '{}' has no blocks",
                template.id
            )));
        }

        let snapshot = Self {
            template_id: Some(template.id.clone()),
            name: template.name.clone(),
            blocks: template.blocks.iter().map(BlockSnapshot::from).collect(),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Checks that the snapshot can back a session.
    ///
    /// Durations are checked on every step regardless of kind, so a typo is
    /// caught even on a step that would currently be untimed.
    pub fn validate(&self) -> Result<()> {
        if self.blocks.is_empty() {
            return Err(CircuitError::InvalidTemplate(format!(
                "template '{}' has no blocks",
                self.name
            )));
        }

        for block in &self.blocks {
            if let Some(secs) = block.block_duration_seconds
                && secs.checked_mul(1000).is_none_or(|ms| ms > MAX_TIMER_MS)
            {
                return Err(CircuitError::InvalidTemplate(format!(
                    "block '{}' duration {}s exceeds the {}s limit",
                    block.name,
                    secs,
                    MAX_TIMER_MS / 1000
                )));
            }

            for step in &block.steps {
                if let Some(ms) = step.duration_ms
                    && ms > MAX_TIMER_MS
                {
                    return Err(CircuitError::InvalidTemplate(format!(
                        "step '{}' in block '{}' duration {}ms exceeds the {}ms limit",
                        step.title, block.name, ms, MAX_TIMER_MS
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn block(&self, index: usize) -> Option<&BlockSnapshot> {
        self.blocks.get(index)
    }

    pub fn step(&self, block_index: usize, step_index: usize) -> Option<&StepSnapshot> {
        self.block(block_index)
            .and_then(|block| block.steps.get(step_index))
    }

    pub fn total_steps(&self) -> usize {
        self.blocks.iter().map(|block| block.steps.len()).sum()
    }
}

impl BlockSnapshot {
    /// Block timer length in milliseconds, when the block is timed at all.
    pub fn timed_duration(&self) -> Option<u64> {
        self.block_duration_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| secs.saturating_mul(1000))
    }

    /// Whether a session may make this block current.
    pub fn is_landable(&self) -> bool {
        !self.block_mode.is_follow_steps() || !self.steps.is_empty()
    }

    pub fn last_step_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }
}

impl StepSnapshot {
    /// Step timer length in milliseconds; `None` for untimed steps.
    pub fn timed_duration(&self) -> Option<u64> {
        match self.step_kind {
            StepKind::Time => self.duration_ms.filter(|ms| *ms > 0),
            _ => None,
        }
    }
}

impl From<&Block> for BlockSnapshot {
    fn from(block: &Block) -> Self {
        Self {
            name: block.name.clone(),
            block_mode: block.block_mode.unwrap_or_default(),
            block_duration_seconds: block.block_duration_seconds,
            block_sets: block.block_sets,
            block_rest_seconds: block.block_rest_seconds,
            steps: block.steps.iter().map(StepSnapshot::from).collect(),
        }
    }
}

impl From<&Step> for StepSnapshot {
    fn from(step: &Step) -> Self {
        Self {
            title: step.title.clone(),
            step_kind: step.step_kind,
            duration_ms: step.duration_ms,
            reps: step.reps,
            exercise_id: step.exercise_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(title: &str, kind: StepKind, duration_ms: Option<u64>) -> Step {
        Step {
            title: title.to_string(),
            step_kind: kind,
            duration_ms,
            reps: None,
            exercise_id: None,
        }
    }

    fn template() -> Template {
        Template {
            id: "tpl-1".to_string(),
            name: "Monday".to_string(),
            blocks: vec![
                Block {
                    name: "Warm-up".to_string(),
                    block_mode: None,
                    block_duration_seconds: None,
                    block_sets: None,
                    block_rest_seconds: None,
                    steps: vec![step("Jumping jacks", StepKind::Time, Some(30_000))],
                },
                Block {
                    name: "Finisher".to_string(),
                    block_mode: Some(BlockMode::Amrap),
                    block_duration_seconds: Some(600),
                    block_sets: None,
                    block_rest_seconds: Some(60),
                    steps: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_resolve_rejects_empty_template() {
        let empty = Template {
            id: "empty".to_string(),
            name: "Nothing".to_string(),
            blocks: vec![],
        };

        let err = TemplateSnapshot::resolve(&empty).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidTemplate(_)));
    }

    #[test]
    fn test_resolve_rejects_oversized_timers() {
        let mut typo = template();
        typo.blocks[0]
            .steps
            .push(step("Plank", StepKind::Time, Some(10_000_000_000_000_000)));
        let err = TemplateSnapshot::resolve(&typo).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidTemplate(ref m) if m.contains("Plank")));

        let mut long_block = template();
        long_block.blocks[1].block_duration_seconds = Some(u64::MAX);
        let err = TemplateSnapshot::resolve(&long_block).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidTemplate(ref m) if m.contains("Finisher")));

        // Exactly at the limit is accepted
        let mut day = template();
        day.blocks[0].steps[0].duration_ms = Some(MAX_TIMER_MS);
        day.blocks[1].block_duration_seconds = Some(MAX_TIMER_MS / 1000);
        assert!(TemplateSnapshot::resolve(&day).is_ok());
    }

    #[test]
    fn test_resolve_defaults_block_mode() {
        let snapshot = TemplateSnapshot::resolve(&template()).unwrap();
        assert_eq!(snapshot.blocks[0].block_mode, BlockMode::FollowSteps);
        assert_eq!(snapshot.blocks[1].block_mode, BlockMode::Amrap);
        assert_eq!(snapshot.template_id.as_deref(), Some("tpl-1"));
    }

    #[test]
    fn test_snapshot_is_detached_from_source() {
        let mut source = template();
        let snapshot = TemplateSnapshot::resolve(&source).unwrap();

        source.blocks[0].steps[0].title = "Burpees".to_string();
        source.blocks[0].steps.push(step("Extra", StepKind::Note, None));
        source.blocks.clear();

        assert_eq!(snapshot.blocks.len(), 2);
        assert_eq!(snapshot.blocks[0].steps.len(), 1);
        assert_eq!(snapshot.blocks[0].steps[0].title, "Jumping jacks");
    }

    #[test]
    fn test_timed_duration() {
        assert_eq!(
            StepSnapshot::from(&step("a", StepKind::Time, Some(1500))).timed_duration(),
            Some(1500)
        );
        assert_eq!(
            StepSnapshot::from(&step("b", StepKind::Time, Some(0))).timed_duration(),
            None
        );
        // Duration on a reps step is ignored
        assert_eq!(
            StepSnapshot::from(&step("c", StepKind::Reps, Some(1500))).timed_duration(),
            None
        );

        let snapshot = TemplateSnapshot::resolve(&template()).unwrap();
        assert_eq!(snapshot.blocks[0].timed_duration(), None);
        assert_eq!(snapshot.blocks[1].timed_duration(), Some(600_000));
    }

    #[test]
    fn test_landable_blocks() {
        let snapshot = TemplateSnapshot::resolve(&template()).unwrap();
        assert!(snapshot.blocks[0].is_landable());
        // Non follow-steps blocks are landable without steps
        assert!(snapshot.blocks[1].is_landable());

        let mut empty_follow = snapshot.blocks[0].clone();
        empty_follow.steps.clear();
        assert!(!empty_follow.is_landable());
        assert_eq!(snapshot.total_steps(), 1);
    }
}
