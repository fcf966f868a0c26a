//! Application layer for Circuit.
//!
//! This crate provides the use case that coordinates the domain engine with
//! a session store and a template provider, plus the long-running helpers
//! (display observer, auto-advance ticker) that clients run around it.

pub mod session;
pub mod session_usecase;

#[cfg(test)]
mod test_support;

pub use session::{AutoAdvanceTicker, ObserveTarget, SessionObserver, SessionUpdater};
pub use session_usecase::{SessionUseCase, TemplateSource};
