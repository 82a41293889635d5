//! Command-line interface definitions

use crate::error::Result;
use crate::options::{parse_value, SemaphoreOptions};
use clap::{Parser, Subcommand};

/// Create, signal and wait on named cross-process semaphores
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only log errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Semaphore operations
///
/// Without `--name`, the semaphore is taken from the `SEMAFOUR_NAME`,
/// `SEMAFOUR_VALUE` and `SEMAFOUR_CREATE` environment variables.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new named semaphore and leave it registered
    Create {
        /// Semaphore name, e.g. `/jobs`
        #[arg(short, long)]
        name: Option<String>,

        /// Initial count (default 0)
        #[arg(long, value_parser = parse_value, allow_negative_numbers = true)]
        value: Option<u32>,
    },

    /// Increment the count of an existing semaphore
    Post {
        /// Semaphore name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Block until the count of an existing semaphore is positive, then take one
    ///
    /// Prints `waiting` once the semaphore is attached, just before blocking.
    Wait {
        /// Semaphore name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Take one from the count if available; prints whether it did
    TryWait {
        /// Semaphore name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove a semaphore name from the system namespace
    Unlink {
        /// Semaphore name
        #[arg(short, long)]
        name: Option<String>,
    },
}

impl Command {
    /// Options for opening the semaphore this command operates on
    ///
    /// `create` makes a new semaphore; every other command attaches. A missing
    /// `--name` falls back to [`SemaphoreOptions::from_env`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the environment fallback fails validation.
    pub fn options(&self) -> Result<SemaphoreOptions> {
        let (name, value) = match self {
            Command::Create { name, value } => (name, *value),
            Command::Post { name }
            | Command::Wait { name }
            | Command::TryWait { name }
            | Command::Unlink { name } => (name, None),
        };

        let options = match name {
            Some(name) => SemaphoreOptions::new(name.clone()),
            None => SemaphoreOptions::from_env()?,
        }
        .create(matches!(self, Command::Create { .. }));

        Ok(match value {
            Some(value) => options.value(value),
            None => options,
        })
    }
}
