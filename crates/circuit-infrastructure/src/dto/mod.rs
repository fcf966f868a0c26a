//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema for persisting data.
//! They are private to the infrastructure layer and handle the evolution
//! of the storage format over time.
//!
//! ### Session Version History
//! - **1.0.0**: Initial schema (absolute deadlines, integer `state_version`)

mod session;

// Re-export session DTOs and migrator
pub use session::{
    BlockModeDTO, BlockSnapshotDTO, SESSION_ENTITY, SessionStatusDTO, SessionV1_0_0, StepKindDTO,
    StepSnapshotDTO, TemplateSnapshotDTO, create_session_migrator,
};
