//! Session orchestration helpers.
//!
//! - `updater`: read → decide → conditional write
//! - `observer`: polling `watch` publisher for displays
//! - `ticker`: per-client auto-advance timer

mod observer;
mod ticker;
mod updater;

pub use observer::{ObserveTarget, SessionObserver};
pub use ticker::AutoAdvanceTicker;
pub use updater::SessionUpdater;
