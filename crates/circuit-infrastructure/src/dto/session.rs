//! Session DTOs and migrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use circuit_core::error::{CircuitError, Result};
use circuit_core::session::{Session, SessionStatus};
use circuit_core::template::{BlockMode, BlockSnapshot, StepKind, StepSnapshot, TemplateSnapshot};

/// Session status DTO matching domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatusDTO {
    Running,
    Paused,
    Stopped,
    Ended,
}

impl From<SessionStatusDTO> for SessionStatus {
    fn from(dto: SessionStatusDTO) -> Self {
        match dto {
            SessionStatusDTO::Running => SessionStatus::Running,
            SessionStatusDTO::Paused => SessionStatus::Paused,
            SessionStatusDTO::Stopped => SessionStatus::Stopped,
            SessionStatusDTO::Ended => SessionStatus::Ended,
        }
    }
}

impl From<SessionStatus> for SessionStatusDTO {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Running => SessionStatusDTO::Running,
            SessionStatus::Paused => SessionStatusDTO::Paused,
            SessionStatus::Stopped => SessionStatusDTO::Stopped,
            SessionStatus::Ended => SessionStatusDTO::Ended,
        }
    }
}

/// Block mode DTO matching domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockModeDTO {
    FollowSteps,
    Amrap,
    Emom,
    ForTime,
    StrengthSets,
}

impl From<BlockModeDTO> for BlockMode {
    fn from(dto: BlockModeDTO) -> Self {
        match dto {
            BlockModeDTO::FollowSteps => BlockMode::FollowSteps,
            BlockModeDTO::Amrap => BlockMode::Amrap,
            BlockModeDTO::Emom => BlockMode::Emom,
            BlockModeDTO::ForTime => BlockMode::ForTime,
            BlockModeDTO::StrengthSets => BlockMode::StrengthSets,
        }
    }
}

impl From<BlockMode> for BlockModeDTO {
    fn from(mode: BlockMode) -> Self {
        match mode {
            BlockMode::FollowSteps => BlockModeDTO::FollowSteps,
            BlockMode::Amrap => BlockModeDTO::Amrap,
            BlockMode::Emom => BlockModeDTO::Emom,
            BlockMode::ForTime => BlockModeDTO::ForTime,
            BlockMode::StrengthSets => BlockModeDTO::StrengthSets,
        }
    }
}

/// Step kind DTO matching domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKindDTO {
    Note,
    Reps,
    Time,
    Load,
}

impl From<StepKindDTO> for StepKind {
    fn from(dto: StepKindDTO) -> Self {
        match dto {
            StepKindDTO::Note => StepKind::Note,
            StepKindDTO::Reps => StepKind::Reps,
            StepKindDTO::Time => StepKind::Time,
            StepKindDTO::Load => StepKind::Load,
        }
    }
}

impl From<StepKind> for StepKindDTO {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Note => StepKindDTO::Note,
            StepKind::Reps => StepKindDTO::Reps,
            StepKind::Time => StepKindDTO::Time,
            StepKind::Load => StepKindDTO::Load,
        }
    }
}

/// Step snapshot DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshotDTO {
    pub title: String,
    pub step_kind: StepKindDTO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
}

impl From<StepSnapshotDTO> for StepSnapshot {
    fn from(dto: StepSnapshotDTO) -> Self {
        StepSnapshot {
            title: dto.title,
            step_kind: dto.step_kind.into(),
            duration_ms: dto.duration_ms,
            reps: dto.reps,
            exercise_id: dto.exercise_id,
        }
    }
}

impl From<StepSnapshot> for StepSnapshotDTO {
    fn from(step: StepSnapshot) -> Self {
        StepSnapshotDTO {
            title: step.title,
            step_kind: step.step_kind.into(),
            duration_ms: step.duration_ms,
            reps: step.reps,
            exercise_id: step.exercise_id,
        }
    }
}

/// Block snapshot DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshotDTO {
    pub name: String,
    pub block_mode: BlockModeDTO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_rest_seconds: Option<u64>,
    #[serde(default)]
    pub steps: Vec<StepSnapshotDTO>,
}

impl From<BlockSnapshotDTO> for BlockSnapshot {
    fn from(dto: BlockSnapshotDTO) -> Self {
        BlockSnapshot {
            name: dto.name,
            block_mode: dto.block_mode.into(),
            block_duration_seconds: dto.block_duration_seconds,
            block_sets: dto.block_sets,
            block_rest_seconds: dto.block_rest_seconds,
            steps: dto.steps.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BlockSnapshot> for BlockSnapshotDTO {
    fn from(block: BlockSnapshot) -> Self {
        BlockSnapshotDTO {
            name: block.name,
            block_mode: block.block_mode.into(),
            block_duration_seconds: block.block_duration_seconds,
            block_sets: block.block_sets,
            block_rest_seconds: block.block_rest_seconds,
            steps: block.steps.into_iter().map(Into::into).collect(),
        }
    }
}

/// Template snapshot DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshotDTO {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub name: String,
    pub blocks: Vec<BlockSnapshotDTO>,
}

impl From<TemplateSnapshotDTO> for TemplateSnapshot {
    fn from(dto: TemplateSnapshotDTO) -> Self {
        TemplateSnapshot {
            template_id: dto.template_id,
            name: dto.name,
            blocks: dto.blocks.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TemplateSnapshot> for TemplateSnapshotDTO {
    fn from(snapshot: TemplateSnapshot) -> Self {
        TemplateSnapshotDTO {
            template_id: snapshot.template_id,
            name: snapshot.name,
            blocks: snapshot.blocks.into_iter().map(Into::into).collect(),
        }
    }
}

/// V1.0.0: Initial session schema.
///
/// Deadlines are stored as RFC 3339 instants, never as countdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct SessionV1_0_0 {
    /// Unique session identifier (UUID format).
    pub id: String,
    pub gym_id: String,
    pub status: SessionStatusDTO,
    pub view_mode: BlockModeDTO,
    pub current_block_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    pub state_version: u64,
    pub template_snapshot: TemplateSnapshotDTO,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert SessionV1_0_0 DTO to domain model.
impl IntoDomain<Session> for SessionV1_0_0 {
    fn into_domain(self) -> Session {
        Session {
            id: self.id,
            gym_id: self.gym_id,
            status: self.status.into(),
            view_mode: self.view_mode.into(),
            current_block_index: self.current_block_index,
            current_step_index: self.current_step_index,
            step_end_time: self.step_end_time,
            block_end_time: self.block_end_time,
            remaining_ms: self.remaining_ms,
            state_version: self.state_version,
            template_snapshot: self.template_snapshot.into(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Convert domain model to SessionV1_0_0 DTO for persistence.
impl FromDomain<Session> for SessionV1_0_0 {
    fn from_domain(session: Session) -> Self {
        SessionV1_0_0 {
            id: session.id,
            gym_id: session.gym_id,
            status: session.status.into(),
            view_mode: session.view_mode.into(),
            current_block_index: session.current_block_index,
            current_step_index: session.current_step_index,
            step_end_time: session.step_end_time,
            block_end_time: session.block_end_time,
            remaining_ms: session.remaining_ms,
            state_version: session.state_version,
            template_snapshot: session.template_snapshot.into(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Entity name the session migration path is registered under.
pub const SESSION_ENTITY: &str = "session";

/// Creates the migrator for session records.
///
/// # Errors
///
/// Returns `Migration` if the migration path cannot be registered.
pub fn create_session_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0.0 -> Session
    let session_path = version_migrate::Migrator::define(SESSION_ENTITY)
        .from::<SessionV1_0_0>()
        .into_with_save::<Session>();

    migrator
        .register(session_path)
        .map_err(|e| CircuitError::migration(format!("Failed to register session path: {}", e)))?;

    Ok(migrator)
}
