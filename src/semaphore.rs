//! Named semaphore handle with blocking and deferred call forms
//!
//! Every operation comes in two forms backed by the same OS call:
//!
//! - `*_sync` runs the call and returns its result directly.
//! - The plain form runs the same call immediately, then delivers the result
//!   to a continuation on the next turn of the compio runtime (see
//!   [`deferred`](crate::deferred)).
//!
//! # Example
//!
//! ```rust,no_run
//! use semafour::{Semaphore, SemaphoreOptions};
//!
//! # fn example() -> semafour::Result<()> {
//! let sem = Semaphore::create(SemaphoreOptions::new("/jobs").value(1))?;
//! assert!(sem.try_wait_sync()?);
//! sem.post_sync()?;
//! sem.close_sync()?;
//! sem.unlink_sync()?;
//! # Ok(())
//! # }
//! ```

use crate::deferred::deliver;
use crate::error::{Result, SemaphoreError};
use crate::options::SemaphoreOptions;
use posix_sem::{Errno, Operation, RawSemaphore, SemError};
use std::cell::Cell;
use tracing::{debug, trace};

/// Lifecycle state of a [`Semaphore`] handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Usable, and the name is still registered
    Open,
    /// Usable, but the name has been removed from the namespace
    Unlinked,
    /// Local reference released; only `unlink` of the name remains possible
    Closed,
}

#[derive(Debug, Clone, Copy, Default)]
struct Lifecycle {
    closed: bool,
    unlinked: bool,
}

/// A process-local handle to a named, cross-process counting semaphore
///
/// The count lives in the kernel and is shared by every process that opened
/// the same name. Closing releases only this handle; unlinking removes only
/// the name. Both are explicit and report misuse as errors.
///
/// A handle is `Send` but not `Sync`: calls on one handle never overlap.
#[derive(Debug)]
pub struct Semaphore {
    raw: RawSemaphore,
    lifecycle: Cell<Lifecycle>,
}

impl Semaphore {
    /// Create or attach according to `options.create`
    ///
    /// Options are validated before any OS call is made.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The options fail validation (`InvalidArgument`)
    /// - The OS rejects the name (`InvalidName`)
    /// - Creating and the name exists (`AlreadyExists`)
    /// - Attaching and the name does not exist (`NotFound`)
    /// - Any other `sem_open` failure (`Os`)
    pub fn new(options: SemaphoreOptions) -> Result<Self> {
        options.validate()?;
        let raw = RawSemaphore::open(&options.name, options.value, options.create)?;
        debug!(
            "Opened semaphore {} (value={}, create={})",
            options.name, options.value, options.create
        );
        Ok(Self {
            raw,
            lifecycle: Cell::new(Lifecycle::default()),
        })
    }

    /// Create a new named semaphore; the name must not exist yet
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn create(options: SemaphoreOptions) -> Result<Self> {
        Self::new(options.create(true))
    }

    /// Attach to an existing named semaphore; `options.value` is ignored
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn open(options: SemaphoreOptions) -> Result<Self> {
        Self::new(options.create(false))
    }

    /// Name this handle was opened with
    #[must_use]
    pub fn name(&self) -> &str {
        self.raw.name()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> HandleState {
        let lifecycle = self.lifecycle.get();
        if lifecycle.closed {
            HandleState::Closed
        } else if lifecycle.unlinked {
            HandleState::Unlinked
        } else {
            HandleState::Open
        }
    }

    fn ensure_open(&self, operation: Operation) -> Result<()> {
        if self.lifecycle.get().closed {
            return Err(SemaphoreError::BadHandle(SemError::new(
                operation,
                Errno::EBADF,
            )));
        }
        Ok(())
    }

    /// Increment the count, waking at most one waiter in any process
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if the handle is closed, or the OS failure.
    pub fn post_sync(&self) -> Result<()> {
        self.ensure_open(Operation::Post)?;
        self.raw.post()?;
        trace!("Posted {}", self.name());
        Ok(())
    }

    /// Block the calling thread until the count is positive, then decrement it
    ///
    /// There is no timeout. Signal interruptions are retried.
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if the handle is closed, or the OS failure.
    pub fn wait_sync(&self) -> Result<()> {
        self.ensure_open(Operation::Wait)?;
        self.raw.wait()?;
        trace!("Acquired {}", self.name());
        Ok(())
    }

    /// Decrement the count if it is positive; never blocks
    ///
    /// Returns whether the count was decremented.
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if the handle is closed, or the OS failure.
    pub fn try_wait_sync(&self) -> Result<bool> {
        self.ensure_open(Operation::TryWait)?;
        let acquired = self.raw.try_wait()?;
        trace!("Try-wait on {}: acquired={}", self.name(), acquired);
        Ok(acquired)
    }

    /// Release this process's reference; the name stays resolvable
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` on every call after the first, or the OS failure.
    pub fn close_sync(&self) -> Result<()> {
        self.ensure_open(Operation::Close)?;
        let mut lifecycle = self.lifecycle.get();
        lifecycle.closed = true;
        self.lifecycle.set(lifecycle);
        self.raw.close()?;
        debug!("Closed semaphore {}", self.name());
        Ok(())
    }

    /// Remove the name from the system namespace
    ///
    /// Allowed before or after [`close_sync`](Self::close_sync); open
    /// references in this and other processes stay usable.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyUnlinked` if this handle already removed the name (the
    /// OS is not consulted, so a name re-created by another process is left
    /// alone), `NotFound` if the name no longer exists, or the OS failure.
    pub fn unlink_sync(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.get();
        if lifecycle.unlinked {
            return Err(SemaphoreError::AlreadyUnlinked(self.name().to_string()));
        }
        Self::unlink_name(self.name())?;
        lifecycle.unlinked = true;
        self.lifecycle.set(lifecycle);
        Ok(())
    }

    /// Remove `name` from the system namespace without holding a handle
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name does not exist, `InvalidName` if it is
    /// malformed, or the OS failure.
    pub fn unlink_name(name: &str) -> Result<()> {
        RawSemaphore::unlink(name)?;
        debug!("Unlinked semaphore {}", name);
        Ok(())
    }

    /// Deferred form of [`post_sync`](Self::post_sync)
    ///
    /// # Panics
    ///
    /// Panics if called outside a compio runtime, before touching the
    /// semaphore.
    pub fn post<F>(&self, callback: F)
    where
        F: FnOnce(Result<()>) + 'static,
    {
        deliver(|| self.post_sync(), callback);
    }

    /// Deferred form of [`wait_sync`](Self::wait_sync)
    ///
    /// The wait itself still blocks the calling thread until the count is
    /// positive; only delivery of the result is deferred.
    ///
    /// # Panics
    ///
    /// Panics if called outside a compio runtime, before touching the
    /// semaphore.
    pub fn wait<F>(&self, callback: F)
    where
        F: FnOnce(Result<()>) + 'static,
    {
        deliver(|| self.wait_sync(), callback);
    }

    /// Deferred form of [`try_wait_sync`](Self::try_wait_sync)
    ///
    /// # Panics
    ///
    /// Panics if called outside a compio runtime, before touching the
    /// semaphore.
    pub fn try_wait<F>(&self, callback: F)
    where
        F: FnOnce(Result<bool>) + 'static,
    {
        deliver(|| self.try_wait_sync(), callback);
    }

    /// Deferred form of [`close_sync`](Self::close_sync)
    ///
    /// # Panics
    ///
    /// Panics if called outside a compio runtime, before touching the
    /// semaphore.
    pub fn close<F>(&self, callback: F)
    where
        F: FnOnce(Result<()>) + 'static,
    {
        deliver(|| self.close_sync(), callback);
    }

    /// Deferred form of [`unlink_sync`](Self::unlink_sync)
    ///
    /// # Panics
    ///
    /// Panics if called outside a compio runtime, before touching the
    /// semaphore.
    pub fn unlink<F>(&self, callback: F)
    where
        F: FnOnce(Result<()>) + 'static,
    {
        deliver(|| self.unlink_sync(), callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_name() -> String {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        format!(
            "/semafour-unit-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn test_state_transitions() {
        let sem = Semaphore::create(SemaphoreOptions::new(unique_name())).unwrap();
        assert_eq!(sem.state(), HandleState::Open);

        sem.unlink_sync().unwrap();
        assert_eq!(sem.state(), HandleState::Unlinked);
        sem.post_sync().unwrap();
        assert!(sem.try_wait_sync().unwrap());

        sem.close_sync().unwrap();
        assert_eq!(sem.state(), HandleState::Closed);
    }

    #[test]
    fn test_unlink_after_close() {
        let sem = Semaphore::create(SemaphoreOptions::new(unique_name())).unwrap();
        sem.close_sync().unwrap();
        sem.unlink_sync().unwrap();
        assert_eq!(sem.state(), HandleState::Closed);
    }

    #[test]
    fn test_second_unlink_skips_the_os() {
        let name = unique_name();
        let sem = Semaphore::create(SemaphoreOptions::new(name.clone())).unwrap();
        sem.unlink_sync().unwrap();

        // another process re-creates the name; this handle must not remove it
        let successor = Semaphore::create(SemaphoreOptions::new(name.clone())).unwrap();
        let err = sem.unlink_sync().unwrap_err();
        assert_eq!(err, SemaphoreError::AlreadyUnlinked(name.clone()));
        assert!(err.is_not_found());

        assert!(Semaphore::open(SemaphoreOptions::new(name)).is_ok());
        successor.unlink_sync().unwrap();
    }

    #[test]
    fn test_closed_errors_name_the_operation() {
        let sem = Semaphore::create(SemaphoreOptions::new(unique_name())).unwrap();
        sem.close_sync().unwrap();

        let err = sem.try_wait_sync().unwrap_err();
        let os = err.os_error().unwrap();
        assert_eq!(os.operation, Operation::TryWait);
        assert_eq!(os.errno, Errno::EBADF);

        sem.unlink_sync().unwrap();
    }

    #[test]
    fn test_deferred_outside_runtime_leaves_count_alone() {
        let name = unique_name();
        let sem = Semaphore::create(SemaphoreOptions::new(name).value(1)).unwrap();

        let posted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sem.post(|_| {});
        }));
        assert!(posted.is_err());

        let waited = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sem.wait(|_| {});
        }));
        assert!(waited.is_err());

        // exactly the initial unit is left
        assert!(sem.try_wait_sync().unwrap());
        assert!(!sem.try_wait_sync().unwrap());
        sem.unlink_sync().unwrap();
    }
}
