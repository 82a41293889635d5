//! Error handling and types

use posix_sem::{SemError, SemErrorKind};
use thiserror::Error;

/// Semaphore handle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemaphoreError {
    /// Caller-supplied configuration failed validation; never reaches the OS
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    /// The OS rejected the semaphore name
    #[error("Invalid semaphore name: {0}")]
    InvalidName(SemError),

    /// Creation requested for a name that already exists
    #[error("Semaphore already exists: {0}")]
    AlreadyExists(SemError),

    /// Attach or unlink requested for a name that does not exist
    #[error("Semaphore not found: {0}")]
    NotFound(SemError),

    /// Operation attempted on a closed handle
    #[error("Bad semaphore handle: {0}")]
    BadHandle(SemError),

    /// This handle already removed its name
    #[error("Semaphore {0} already unlinked")]
    AlreadyUnlinked(String),

    /// Any other OS failure, preserved verbatim
    #[error("OS error: {0}")]
    Os(SemError),
}

impl SemaphoreError {
    /// Build an `InvalidArgument` error
    pub(crate) fn invalid_argument(msg: &str) -> Self {
        SemaphoreError::InvalidArgument(msg.to_string())
    }

    /// Check if error is a failed validation
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SemaphoreError::InvalidArgument(_))
    }

    /// Check if error means the name does not exist (any longer)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SemaphoreError::NotFound(_) | SemaphoreError::AlreadyUnlinked(_)
        )
    }

    /// Check if error is due to using a closed handle
    #[must_use]
    pub fn is_bad_handle(&self) -> bool {
        matches!(self, SemaphoreError::BadHandle(_))
    }

    /// The underlying OS error, if the failure came from a system call
    #[must_use]
    pub fn os_error(&self) -> Option<&SemError> {
        match self {
            SemaphoreError::InvalidName(e)
            | SemaphoreError::AlreadyExists(e)
            | SemaphoreError::NotFound(e)
            | SemaphoreError::BadHandle(e)
            | SemaphoreError::Os(e) => Some(e),
            SemaphoreError::InvalidArgument(_) | SemaphoreError::AlreadyUnlinked(_) => None,
        }
    }
}

impl From<SemError> for SemaphoreError {
    fn from(err: SemError) -> Self {
        match err.kind() {
            SemErrorKind::AlreadyExists => SemaphoreError::AlreadyExists(err),
            SemErrorKind::NotFound => SemaphoreError::NotFound(err),
            SemErrorKind::InvalidName => SemaphoreError::InvalidName(err),
            SemErrorKind::BadHandle => SemaphoreError::BadHandle(err),
            // the adapter retries EINTR, so one here is an unexpected OS failure
            SemErrorKind::Interrupted | SemErrorKind::Other => SemaphoreError::Os(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, SemaphoreError>;
