//! Workout template domain module.
//!
//! # Module Structure
//!
//! - `model`: Editable source templates (`Template`, `Block`, `Step`)
//! - `snapshot`: Immutable snapshots frozen at session start
//! - `provider`: Trait for looking templates up by ID
//!
//! # Usage
//!
//! ```ignore
//! use circuit_core::template::{Template, TemplateSnapshot, TemplateProvider};
//! ```

mod model;
mod provider;
mod snapshot;

// Re-export public API
pub use model::{Block, BlockMode, Step, StepKind, Template};
pub use provider::TemplateProvider;
pub use snapshot::{BlockSnapshot, MAX_TIMER_MS, StepSnapshot, TemplateSnapshot};
