//! Named-semaphore namespace limits and name validation

use crate::error::{Operation, Result, SemError};
use nix::errno::Errno;
use std::ffi::CString;

/// Longest filename component the kernel accepts
const NAME_MAX: usize = 255;

/// Longest semaphore name accepted, in bytes
///
/// On Linux the semaphore lives at `/dev/shm/sem.<name>`, so four bytes of the
/// filename limit go to the `sem.` prefix.
pub const SEM_NAME_MAX_LEN: usize = NAME_MAX - 4;

/// Largest initial count accepted by `sem_open`
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const SEM_VALUE_MAX: u32 = 32_767;

/// Largest initial count accepted by `sem_open`
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const SEM_VALUE_MAX: u32 = i32::MAX as u32;

/// Check that `name` is usable as a semaphore name and convert it for FFI
///
/// A valid name is non-empty, contains no NUL bytes, has no `/` other than an
/// optional leading one, and is shorter than [`SEM_NAME_MAX_LEN`].
///
/// # Errors
///
/// Returns a `sem_open` error with `EINVAL` for malformed names and
/// `ENAMETOOLONG` for names that are too long.
pub fn validate_name(name: &str) -> Result<CString> {
    let invalid = || SemError::new(Operation::Open, Errno::EINVAL);

    let bare = name.strip_prefix('/').unwrap_or(name);
    if bare.is_empty() || bare.contains('/') {
        return Err(invalid());
    }
    if name.len() >= SEM_NAME_MAX_LEN {
        return Err(SemError::new(Operation::Open, Errno::ENAMETOOLONG));
    }

    CString::new(name).map_err(|_| invalid())
}
