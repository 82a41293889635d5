//! semafour: named, cross-process counting semaphores
//!
//! This library wraps POSIX named semaphores in a handle with an explicit
//! lifecycle (open, unlinked, closed) and exposes every operation in a
//! blocking form and a deferred, continuation-based form that runs on the
//! compio runtime.

pub mod cli;
pub mod deferred;
pub mod error;
pub mod options;
pub mod semaphore;

// Re-export commonly used types
pub use error::{Result, SemaphoreError};
pub use options::SemaphoreOptions;
pub use semaphore::{HandleState, Semaphore};
