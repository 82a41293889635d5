//! # posix-sem
//!
//! Safe wrapper over POSIX named semaphores:
//! - `sem_open` to create a new named semaphore or attach to an existing one
//! - `sem_post` / `sem_wait` / `sem_trywait` on the shared count
//! - `sem_close` to release the process-local reference
//! - `sem_unlink` to remove the name from the system namespace
//!
//! Every failure is reported as a [`SemError`] carrying the OS error code, the
//! name of the failing call and the OS description of the code.
//!
//! ## Example
//!
//! ```rust,no_run
//! use posix_sem::RawSemaphore;
//!
//! # fn example() -> Result<(), posix_sem::SemError> {
//! let sem = RawSemaphore::open("/example", 1, true)?;
//! assert!(sem.try_wait()?);
//! sem.post()?;
//! sem.close()?;
//! RawSemaphore::unlink("/example")?;
//! # Ok(())
//! # }
//! ```

#[cfg(not(unix))]
compile_error!("posix-sem requires a POSIX platform");

pub mod error;
pub mod name;
pub mod semaphore;

pub use error::{Operation, Result, SemError, SemErrorKind};
pub use nix::errno::Errno;
pub use name::{validate_name, SEM_NAME_MAX_LEN, SEM_VALUE_MAX};
pub use semaphore::RawSemaphore;
