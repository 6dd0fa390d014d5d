use super::TaskId;
use crate::runtime::executor::Executor;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

/// Completion slot shared between a task and its [`JoinHandle`].
pub(crate) struct JoinState<T> {
    result: RefCell<Option<T>>,
    finished: Cell<bool>,
    waiter: RefCell<Option<Waker>>,
}

impl<T> JoinState<T> {
    pub(crate) fn new() -> Self {
        Self {
            result: RefCell::new(None),
            finished: Cell::new(false),
            waiter: RefCell::new(None),
        }
    }

    /// Stores the task's output and wakes the handle, if it is awaited.
    pub(crate) fn complete(&self, value: T) {
        *self.result.borrow_mut() = Some(value);
        self.finished.set(true);

        if let Some(waker) = self.waiter.borrow_mut().take() {
            waker.wake();
        }
    }
}

/// A handle to a spawned task.
///
/// A `JoinHandle` resolves to the task's output once it completes.
/// Dropping the handle does **not** cancel the task; use
/// [`abort`](Self::abort) for that.
pub struct JoinHandle<T> {
    pub(crate) id: TaskId,
    pub(crate) state: Rc<JoinState<T>>,
    pub(crate) executor: Weak<Executor>,
}

impl<T> JoinHandle<T> {
    /// Identifier of the task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns `true` once the task has produced its output.
    pub fn is_finished(&self) -> bool {
        self.state.finished.get()
    }

    /// Terminates the task.
    ///
    /// The task's future is dropped without being polled again and its id
    /// stops resolving: any wait queue still holding it will skip it.
    /// Aborting a finished task does nothing.
    pub fn abort(self) {
        if let Some(executor) = self.executor.upgrade() {
            executor.abort(self.id);
        }
    }

    /// Takes the output if the task has finished.
    pub(crate) fn try_take(&self) -> Option<T> {
        self.state.result.borrow_mut().take()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    /// Resolves with the task's output, registering the waker otherwise.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if self.state.finished.get() {
            let value = self
                .try_take()
                .expect("JoinHandle polled after completion");

            return Poll::Ready(value);
        }

        *self.state.waiter.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}
