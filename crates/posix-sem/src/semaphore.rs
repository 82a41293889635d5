//! Process-local reference to a POSIX named semaphore

use crate::error::{Operation, Result, SemError};
use crate::name::validate_name;
use nix::errno::Errno;
use std::cell::Cell;
use std::ptr;

/// Permission bits for newly created semaphores
const CREATE_MODE: libc::c_uint = 0o644;

/// An open reference to a named semaphore
///
/// The kernel object is shared by every process that has the name open. This
/// value only owns the local reference: [`close`](Self::close) releases it and
/// [`unlink`](Self::unlink) removes the name, independently of each other.
///
/// `RawSemaphore` is `Send` but not `Sync`. Threads that need the same
/// semaphore concurrently should each open the name themselves.
#[derive(Debug)]
pub struct RawSemaphore {
    /// `sem_t` returned by `sem_open`, null once closed
    sem: Cell<*mut libc::sem_t>,
    /// Name the semaphore was opened with
    name: String,
}

// SAFETY: a `sem_t` from `sem_open` may be used from any thread of the process.
// The `Cell` keeps the type `!Sync`, so `close` cannot race another call.
unsafe impl Send for RawSemaphore {}

impl RawSemaphore {
    /// Create a new named semaphore or attach to an existing one
    ///
    /// With `create` set the name must not exist yet (`O_CREAT | O_EXCL`) and
    /// the count starts at `value`. Otherwise the name must already exist and
    /// `value` is ignored.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The name is malformed or too long (`EINVAL`, `ENAMETOOLONG`)
    /// - `create` is set and the name already exists (`EEXIST`)
    /// - `create` is unset and the name does not exist (`ENOENT`)
    /// - `value` exceeds [`SEM_VALUE_MAX`](crate::SEM_VALUE_MAX) (`EINVAL`)
    /// - Any other `sem_open` failure such as `EACCES` or `EMFILE`
    pub fn open(name: &str, value: u32, create: bool) -> Result<Self> {
        let c_name = validate_name(name)?;

        let sem = if create {
            // SAFETY: `c_name` is a valid NUL-terminated string and the
            // variadic arguments match what `O_CREAT` expects.
            unsafe {
                libc::sem_open(
                    c_name.as_ptr(),
                    libc::O_CREAT | libc::O_EXCL,
                    CREATE_MODE,
                    value as libc::c_uint,
                )
            }
        } else {
            // SAFETY: `c_name` is a valid NUL-terminated string.
            unsafe { libc::sem_open(c_name.as_ptr(), 0) }
        };

        if sem == libc::SEM_FAILED {
            return Err(SemError::last(Operation::Open));
        }

        log::debug!("sem_open({name}, value={value}, create={create})");
        Ok(Self {
            sem: Cell::new(sem),
            name: name.to_string(),
        })
    }

    /// Name this semaphore was opened with
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sem.get().is_null()
    }

    fn handle(&self, operation: Operation) -> Result<*mut libc::sem_t> {
        let sem = self.sem.get();
        if sem.is_null() {
            return Err(SemError::new(operation, Errno::EBADF));
        }
        Ok(sem)
    }

    /// Increment the count, waking at most one blocked waiter
    ///
    /// # Errors
    ///
    /// Returns `EBADF` if the semaphore was closed, or the `sem_post` error
    /// (for example `EOVERFLOW`).
    pub fn post(&self) -> Result<()> {
        let sem = self.handle(Operation::Post)?;
        // SAFETY: `sem` is open until `close` nulls it out.
        if unsafe { libc::sem_post(sem) } != 0 {
            return Err(SemError::last(Operation::Post));
        }
        Ok(())
    }

    /// Block until the count is positive, then decrement it
    ///
    /// Interruptions by signals are retried.
    ///
    /// # Errors
    ///
    /// Returns `EBADF` if the semaphore was closed, or the `sem_wait` error.
    pub fn wait(&self) -> Result<()> {
        let sem = self.handle(Operation::Wait)?;
        loop {
            // SAFETY: `sem` is open until `close` nulls it out.
            if unsafe { libc::sem_wait(sem) } == 0 {
                return Ok(());
            }
            match Errno::last() {
                Errno::EINTR => log::trace!("sem_wait({}) interrupted, retrying", self.name),
                errno => return Err(SemError::new(Operation::Wait, errno)),
            }
        }
    }

    /// Decrement the count if it is positive, without blocking
    ///
    /// Returns whether the count was decremented.
    ///
    /// # Errors
    ///
    /// Returns `EBADF` if the semaphore was closed, or the `sem_trywait` error
    /// for anything other than `EAGAIN`.
    pub fn try_wait(&self) -> Result<bool> {
        let sem = self.handle(Operation::TryWait)?;
        loop {
            // SAFETY: `sem` is open until `close` nulls it out.
            if unsafe { libc::sem_trywait(sem) } == 0 {
                return Ok(true);
            }
            match Errno::last() {
                Errno::EAGAIN => return Ok(false),
                Errno::EINTR => continue,
                errno => return Err(SemError::new(Operation::TryWait, errno)),
            }
        }
    }

    /// Release the process-local reference
    ///
    /// The name stays resolvable by other processes until it is unlinked.
    ///
    /// # Errors
    ///
    /// Returns `EBADF` if the semaphore was already closed, or the `sem_close`
    /// error.
    pub fn close(&self) -> Result<()> {
        let sem = self.handle(Operation::Close)?;
        self.sem.set(ptr::null_mut());
        // SAFETY: `sem` came from `sem_open` and is closed exactly once.
        if unsafe { libc::sem_close(sem) } != 0 {
            return Err(SemError::last(Operation::Close));
        }
        log::debug!("sem_close({})", self.name);
        Ok(())
    }

    /// Remove `name` from the system namespace
    ///
    /// References that are already open stay usable until they are closed.
    ///
    /// # Errors
    ///
    /// Returns `ENOENT` if the name does not exist, `EINVAL`/`ENAMETOOLONG` if
    /// it is malformed, or the `sem_unlink` error.
    pub fn unlink(name: &str) -> Result<()> {
        let c_name =
            validate_name(name).map_err(|e| SemError::new(Operation::Unlink, e.errno))?;
        // SAFETY: `c_name` is a valid NUL-terminated string.
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } != 0 {
            return Err(SemError::last(Operation::Unlink));
        }
        log::debug!("sem_unlink({name})");
        Ok(())
    }
}

impl Drop for RawSemaphore {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = self.close() {
            log::warn!("failed to close semaphore {} on drop: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SemErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_name() -> String {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        format!(
            "/posix-sem-test-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn test_try_wait_follows_count() {
        let name = unique_name();
        let sem = RawSemaphore::open(&name, 1, true).unwrap();

        assert!(sem.try_wait().unwrap());
        assert!(!sem.try_wait().unwrap());
        sem.post().unwrap();
        assert!(sem.try_wait().unwrap());

        sem.close().unwrap();
        RawSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_wait_returns_when_count_positive() {
        let name = unique_name();
        let sem = RawSemaphore::open(&name, 2, true).unwrap();

        sem.wait().unwrap();
        sem.wait().unwrap();
        assert!(!sem.try_wait().unwrap());

        RawSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_exclusive_create_and_attach() {
        let name = unique_name();

        let err = RawSemaphore::open(&name, 0, false).unwrap_err();
        assert_eq!(err.kind(), SemErrorKind::NotFound);
        assert_eq!(err.operation, Operation::Open);

        let creator = RawSemaphore::open(&name, 1, true).unwrap();
        let err = RawSemaphore::open(&name, 1, true).unwrap_err();
        assert_eq!(err.kind(), SemErrorKind::AlreadyExists);

        // value is ignored when attaching
        let attached = RawSemaphore::open(&name, 5, false).unwrap();
        assert!(attached.try_wait().unwrap());
        assert!(!creator.try_wait().unwrap());

        RawSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_closed_semaphore_is_bad_handle() {
        let name = unique_name();
        let sem = RawSemaphore::open(&name, 0, true).unwrap();
        sem.close().unwrap();
        assert!(sem.is_closed());

        for err in [
            sem.post().unwrap_err(),
            sem.wait().unwrap_err(),
            sem.try_wait().unwrap_err(),
            sem.close().unwrap_err(),
        ] {
            assert_eq!(err.errno, Errno::EBADF);
            assert_eq!(err.kind(), SemErrorKind::BadHandle);
        }

        RawSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_unlink_twice_is_not_found() {
        let name = unique_name();
        let sem = RawSemaphore::open(&name, 0, true).unwrap();

        RawSemaphore::unlink(&name).unwrap();
        let err = RawSemaphore::unlink(&name).unwrap_err();
        assert_eq!(err.kind(), SemErrorKind::NotFound);
        assert_eq!(err.operation, Operation::Unlink);

        // still usable after the name is gone
        sem.post().unwrap();
        assert!(sem.try_wait().unwrap());
    }

    #[test]
    fn test_unlink_malformed_name() {
        let err = RawSemaphore::unlink("/a/b").unwrap_err();
        assert_eq!(err.operation, Operation::Unlink);
        assert_eq!(err.kind(), SemErrorKind::InvalidName);
    }
}
