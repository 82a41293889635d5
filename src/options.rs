//! Semaphore construction options
//!
//! [`SemaphoreOptions`] carries the three recognized settings with their
//! defaults. Textual sources (environment variables, command-line flags) go
//! through [`parse_value`] and [`parse_create`] so loosely-typed input is
//! rejected the same way everywhere.

use crate::error::{Result, SemaphoreError};
use posix_sem::SEM_VALUE_MAX;

/// Environment variable holding the semaphore name
pub const ENV_NAME: &str = "SEMAFOUR_NAME";
/// Environment variable holding the initial count
pub const ENV_VALUE: &str = "SEMAFOUR_VALUE";
/// Environment variable selecting create (`true`) or attach (`false`)
pub const ENV_CREATE: &str = "SEMAFOUR_CREATE";

const NAME_MSG: &str = "name must be a string";
const VALUE_MSG: &str = "value must be an unsigned integer";
const CREATE_MSG: &str = "create must be a boolean";

/// Options for creating or attaching to a named semaphore
///
/// # Example
///
/// ```rust
/// use semafour::SemaphoreOptions;
///
/// let options = SemaphoreOptions::new("/jobs").value(4);
/// assert!(options.create);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreOptions {
    /// System-wide name processes rendezvous on
    pub name: String,
    /// Initial count, only used when creating (default 0)
    pub value: u32,
    /// Create a new semaphore (`true`, default) or attach to an existing one
    pub create: bool,
}

impl SemaphoreOptions {
    /// Options for `name` with the default count of 0 and `create` set
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 0,
            create: true,
        }
    }

    /// Set the initial count
    #[must_use]
    pub fn value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }

    /// Choose between creating and attaching
    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Validate the options without touching the OS
    ///
    /// Checks run in order: the name, then the count (create path only).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is empty or contains a NUL byte,
    /// or if `create` is set and `value` exceeds [`SEM_VALUE_MAX`].
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains('\0') {
            return Err(SemaphoreError::invalid_argument(NAME_MSG));
        }
        if self.create && self.value > SEM_VALUE_MAX {
            return Err(SemaphoreError::invalid_argument(VALUE_MSG));
        }
        Ok(())
    }

    /// Build options from a key lookup such as the process environment
    ///
    /// Reads [`ENV_NAME`] (required), [`ENV_VALUE`] and [`ENV_CREATE`]
    /// (optional, defaulting to 0 and `true`). Errors are reported in the
    /// same order as [`validate`](Self::validate), with the boolean check last.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is missing or invalid, the count
    /// is not an unsigned integer, or `create` is not a boolean.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup(ENV_NAME)
            .filter(|name| !name.is_empty() && !name.contains('\0'))
            .ok_or_else(|| SemaphoreError::invalid_argument(NAME_MSG))?;
        let create = lookup(ENV_CREATE).map(|raw| parse_create(&raw));
        let create_path = !matches!(create, Some(Ok(false)));

        let value = match lookup(ENV_VALUE) {
            Some(raw) if create_path => parse_value(&raw)?,
            _ => 0,
        };

        let options = Self::new(name)
            .value(value)
            .create(create.transpose()?.unwrap_or(true));
        options.validate()?;
        Ok(options)
    }

    /// Build options from `SEMAFOUR_NAME`, `SEMAFOUR_VALUE` and `SEMAFOUR_CREATE`
    ///
    /// # Errors
    ///
    /// Same as [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Parse an initial count
///
/// Only plain non-negative integers up to [`SEM_VALUE_MAX`] are accepted;
/// `NaN`, infinities, fractions, negatives and non-numeric text all fail the
/// same way.
///
/// # Errors
///
/// Returns `InvalidArgument: value must be an unsigned integer`.
pub fn parse_value(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SemaphoreError::invalid_argument(VALUE_MSG));
    }
    raw.parse::<u32>()
        .ok()
        .filter(|value| *value <= SEM_VALUE_MAX)
        .ok_or_else(|| SemaphoreError::invalid_argument(VALUE_MSG))
}

/// Parse the create flag; only `true` and `false` are accepted
///
/// # Errors
///
/// Returns `InvalidArgument: create must be a boolean`.
pub fn parse_create(raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SemaphoreError::invalid_argument(CREATE_MSG)),
    }
}
