//! Error types.
//!
//! Only [`LockError`] is surfaced by the synchronization primitives.
//! [`TaskDead`] is produced by schedulers and absorbed by hand-off logic,
//! and [`RuntimeError`] is returned by [`Runtime::try_block_on`].
//!
//! [`Runtime::try_block_on`]: crate::Runtime::try_block_on

use thiserror::Error;

/// Failure of a lock or wait operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The calling task already owns the mutex it tried to lock.
    ///
    /// Mutexes are not reentrant; the call fails before any suspension.
    #[error("deadlock; recursive locking")]
    Deadlock,

    /// `wait` was called with a mutex the calling task does not hold.
    ///
    /// No state is mutated when this is returned.
    #[error("mutex is not held by the waiting task")]
    NotOwner,
}

/// The target of a wakeup is no longer alive.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("task is no longer alive")]
pub struct TaskDead;

/// Failure of the runtime itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// Every remaining task is suspended, so the root future can never
    /// complete.
    #[error("runtime stalled: {suspended} task(s) suspended and none runnable")]
    Stalled {
        /// Number of tasks still alive when the stall was detected.
        suspended: usize,
    },
}
