//! Storage layer for atomic file operations.

mod atomic_file;

pub use atomic_file::{AtomicTomlFile, FileLock, read_optional, write_atomic};
