//! Deferred delivery of operation results
//!
//! The non-blocking forms of every [`Semaphore`](crate::Semaphore) operation
//! do their OS call immediately and hand the result to [`deliver`], which
//! schedules the continuation as a task on the current compio runtime. The
//! continuation therefore never runs on the caller's stack: code following
//! the call always executes first.

use crate::error::Result;
use compio::runtime::Runtime;

/// Run `operation` now and schedule `continuation` with its result on the
/// next turn of the compio runtime
///
/// The runtime is checked before `operation` runs, so a missing runtime never
/// leaves a committed OS call whose result nobody receives.
///
/// # Panics
///
/// Panics if called outside a compio runtime, without running `operation`.
pub fn deliver<T, O, F>(operation: O, continuation: F)
where
    T: 'static,
    O: FnOnce() -> Result<T>,
    F: FnOnce(Result<T>) + 'static,
{
    assert!(
        Runtime::try_with_current(|_| ()).is_ok(),
        "deferred semaphore operations must run inside a compio runtime"
    );
    let result = operation();
    compio::runtime::spawn(async move { continuation(result) }).detach();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SemaphoreError;
    use futures::channel::oneshot;
    use std::cell::Cell;
    use std::rc::Rc;

    #[compio::test]
    async fn test_continuation_runs_after_caller() {
        let ran = Rc::new(Cell::new(false));
        let (tx, rx) = oneshot::channel();

        let flag = ran.clone();
        deliver(
            || Ok(7),
            move |result: Result<u32>| {
                flag.set(true);
                tx.send(result).unwrap();
            },
        );
        assert!(!ran.get());

        assert_eq!(rx.await.unwrap(), Ok(7));
        assert!(ran.get());
    }

    #[compio::test]
    async fn test_errors_are_delivered_not_raised() {
        let (tx, rx) = oneshot::channel();
        deliver(
            || Err(SemaphoreError::AlreadyUnlinked("/gone".to_string())),
            move |result: Result<()>| tx.send(result).unwrap(),
        );
        assert!(rx.await.unwrap().unwrap_err().is_not_found());
    }

    #[test]
    fn test_outside_runtime_operation_never_runs() {
        let ran = Cell::new(false);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            deliver(
                || {
                    ran.set(true);
                    Ok(())
                },
                |_: Result<()>| {},
            );
        }));
        assert!(outcome.is_err());
        assert!(!ran.get());
    }
}
