//! Synchronization primitives for cooperative tasks.
//!
//! Only one task runs at a time and control changes hands only at `.await`
//! points, so these primitives need no hardware atomics. A multi-step
//! update (check the owner then set it, dequeue a waiter then wake it) is
//! made atomic by raising the scheduler's critical flag for its duration
//! through a [`CriticalSection`] guard.
//!
//! The primitives include:
//! - [`Mutex`]: a non-reentrant lock with FIFO hand-off and self-deadlock
//!   detection.
//! - [`ConditionVariable`]: parks tasks until signalled, releasing and
//!   reacquiring a [`Mutex`] around the wait.
//! - [`Queue`]: an unbounded FIFO queue whose consumers block while empty.
//! - [`WaitQueue`]: the pooled FIFO of waiting tasks the others build on.
//!
//! ## Design notes
//!
//! - Primitives talk to the scheduler only through the [`Scheduler`]
//!   trait. By default they use [`Current`](crate::Current), the runtime
//!   entered on the calling thread.
//! - A waiter that dies while queued is skipped when a wakeup reaches it.
//! - Dropping a primitive while a live task is still queued on it panics.

mod condvar;
mod mutex;
mod queue;
mod scheduler;
mod wait_queue;

#[cfg(test)]
pub(crate) mod testing;

pub use condvar::ConditionVariable;
pub use mutex::Mutex;
pub use queue::Queue;
pub use scheduler::{CriticalSection, Scheduler};
pub use wait_queue::{Iter, WaitQueue};

use crate::runtime::Current;

/// Runs `action` with preemption disabled on the current runtime.
///
/// No other task can run until `action` returns. The critical flag is
/// restored on every exit path.
///
/// # Examples
///
/// ```rust,ignore
/// let snapshot = greensync::sync::exclusive(|| shared.borrow().clone());
/// ```
pub fn exclusive<R>(action: impl FnOnce() -> R) -> R {
    exclusive_with(&Current, action)
}

/// Runs `action` with `scheduler`'s critical flag raised.
pub fn exclusive_with<S: Scheduler, R>(scheduler: &S, action: impl FnOnce() -> R) -> R {
    let _critical = CriticalSection::enter(scheduler);
    action()
}
