//! Error types for POSIX semaphore operations

use nix::errno::Errno;
use std::fmt;
use thiserror::Error;

/// Result type for posix-sem operations
pub type Result<T> = std::result::Result<T, SemError>;

/// The semaphore call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `sem_open`
    Open,
    /// `sem_post`
    Post,
    /// `sem_wait`
    Wait,
    /// `sem_trywait`
    TryWait,
    /// `sem_close`
    Close,
    /// `sem_unlink`
    Unlink,
}

impl Operation {
    /// Name of the underlying POSIX call
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Open => "sem_open",
            Operation::Post => "sem_post",
            Operation::Wait => "sem_wait",
            Operation::TryWait => "sem_trywait",
            Operation::Close => "sem_close",
            Operation::Unlink => "sem_unlink",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`SemError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemErrorKind {
    /// Exclusive creation requested for a name that already exists
    AlreadyExists,
    /// Attach or unlink requested for a name that does not exist
    NotFound,
    /// The name is malformed or too long
    InvalidName,
    /// The semaphore reference is closed or otherwise unusable
    BadHandle,
    /// A blocking call was interrupted by a signal
    Interrupted,
    /// Any other OS failure
    Other,
}

/// A failed semaphore system call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message} ({errno:?})")]
pub struct SemError {
    /// OS error code
    pub errno: Errno,
    /// The call that failed
    pub operation: Operation,
    /// Human-readable description of `errno`
    pub message: String,
}

impl SemError {
    /// Build an error for `operation` from an explicit code
    #[must_use]
    pub fn new(operation: Operation, errno: Errno) -> Self {
        Self {
            errno,
            operation,
            message: errno.desc().to_string(),
        }
    }

    /// Build an error for `operation` from the calling thread's `errno`
    #[must_use]
    pub fn last(operation: Operation) -> Self {
        Self::new(operation, Errno::last())
    }

    /// Numeric OS error code
    #[must_use]
    pub fn raw_os_error(&self) -> i32 {
        self.errno as i32
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> SemErrorKind {
        match (self.errno, self.operation) {
            (Errno::EINTR, _) => SemErrorKind::Interrupted,
            (Errno::EEXIST, _) => SemErrorKind::AlreadyExists,
            (Errno::ENOENT, _) => SemErrorKind::NotFound,
            (Errno::EINVAL | Errno::ENAMETOOLONG, Operation::Open | Operation::Unlink) => {
                SemErrorKind::InvalidName
            }
            (Errno::EBADF | Errno::EINVAL, _) => SemErrorKind::BadHandle,
            _ => SemErrorKind::Other,
        }
    }
}
