//! Session domain module.
//!
//! This module contains the session aggregate, the transition engine that
//! computes each next record, the auto-advance decision and the display
//! projection.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `SessionStatus`)
//! - `transition`: Pure state-transition engine (`start`, `apply`, ...)
//! - `auto_advance`: Deadline checks safe to run from many pollers
//! - `view`: Countdown projection for display screens (`SessionView`)
//! - `repository`: Repository trait for versioned session persistence
//!
//! # Usage
//!
//! ```ignore
//! use circuit_core::session::{Session, SessionRepository, Transition, Direction};
//! use circuit_core::session::transition;
//! ```

pub mod auto_advance;
mod model;
mod repository;
pub mod transition;
mod view;


// Re-export public API
pub use auto_advance::{AutoAdvanceDecision, AutoAdvanceOutcome, NoOpReason};
pub use model::{Session, SessionStatus};
pub use repository::SessionRepository;
pub use transition::{Direction, Transition};
pub use view::SessionView;
