//! Domain layer for Circuit.
//!
//! Templates, the session aggregate and the pure transition engine that
//! drives a live group-training session, plus the traits the outer layers
//! implement to store sessions and look up templates.

pub mod clock;
pub mod config;
pub mod error;
pub mod session;
pub mod template;

// Re-export common error type
pub use error::{CircuitError, Result};
