use super::state::{CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use super::{JoinHandle, TaskId};
use crate::runtime::Current;
use crate::runtime::context;
use crate::runtime::executor::ReadyQueue;
use crate::sync::Scheduler;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Boxed task future. Tasks never leave the runtime thread, so they need
/// not be `Send`.
pub(crate) type TaskFuture = Pin<Box<dyn Future<Output = ()>>>;

/// The part of a task shared with its wakers.
///
/// Wakers can be cloned freely, so this is kept `Send + Sync` and holds no
/// reference to the future itself.
pub(crate) struct Header {
    /// Identifier of the task.
    pub(crate) id: TaskId,

    /// The current lifecycle state of the task (IDLE, RUNNING, etc.).
    pub(crate) state: AtomicUsize,

    /// Set by `mark_runnable`; consumed when the task leaves
    /// `suspend_current`.
    unparked: AtomicBool,

    /// Ready queue the task is pushed onto when woken.
    ready: Arc<ReadyQueue>,
}

impl Header {
    pub(crate) fn new(id: TaskId, ready: Arc<ReadyQueue>) -> Self {
        Self {
            id,
            state: AtomicUsize::new(QUEUED),
            unparked: AtomicBool::new(false),
            ready,
        }
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `IDLE`, it moves to `QUEUED` and is pushed to the ready queue.
    /// If the task is `RUNNING`, it moves to `NOTIFIED` to ensure it is re-polled
    /// after its current poll.
    pub(crate) fn wake(&self) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.ready.push(self.id);
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already scheduled or finished: nothing to do.
                _ => return,
            }
        }
    }

    /// Transitions a queued task to `RUNNING`.
    ///
    /// Returns `false` if the task is not in a runnable state.
    pub(crate) fn begin_poll(&self) -> bool {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED && current != NOTIFIED {
            return false;
        }

        self.state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Settles the state after a poll returned `Pending`.
    ///
    /// Returns `true` if the task was woken during the poll and went back
    /// to the ready queue.
    pub(crate) fn end_poll(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => false,
            Err(NOTIFIED) => {
                // Woken while running; back to the ready queue.
                self.state.store(QUEUED, Ordering::Release);
                self.ready.push(self.id);
                true
            }
            // Aborted while running.
            Err(_) => false,
        }
    }

    pub(crate) fn complete(&self) {
        self.state.store(COMPLETED, Ordering::Release);
    }

    pub(crate) fn cancel(&self) {
        self.state.store(CANCELLED, Ordering::Release);
    }

    /// Returns `true` until the task completes or is cancelled.
    pub(crate) fn is_alive(&self) -> bool {
        !matches!(self.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }

    /// Grants the task permission to leave `suspend_current` and wakes it.
    pub(crate) fn unpark(&self) {
        self.unparked.store(true, Ordering::Release);
        self.wake();
    }

    /// Consumes the unpark permission, returning whether it was set.
    pub(crate) fn take_unpark(&self) -> bool {
        self.unparked.swap(false, Ordering::AcqRel)
    }
}

/// A task slot owned by the executor.
pub(crate) struct Task {
    pub(crate) header: Arc<Header>,

    /// The task's future. `None` while the executor is polling it.
    pub(crate) future: Option<TaskFuture>,
}

/// Spawns a future as a task onto the current runtime.
///
/// The task is appended to the ready queue and first runs once the
/// spawning task reaches an `.await` that yields.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    context::current_executor()
        .expect("spawn must be called within the context of a runtime")
        .spawn(future)
}

/// Returns the id of the task currently running.
///
/// # Panics
///
/// Panics if called outside a task running on a runtime.
pub fn current() -> TaskId {
    Current.current_task()
}
