use super::ReadyQueue;
use crate::error::RuntimeError;
use crate::runtime::task::waker::make_waker;
use crate::runtime::task::{Header, JoinHandle, JoinState, Task, TaskFuture, TaskId};
use crate::utils::Slab;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use tracing::{debug, error, trace, warn};

/// Single-threaded cooperative executor.
///
/// The `Executor` is responsible for:
/// - owning every task and handing out [`TaskId`]s,
/// - polling ready tasks one at a time in FIFO order,
/// - holding the critical (non-preemption) flag,
/// - resolving task ids for the scheduler interface.
///
/// While the critical flag is raised the executor does not switch away
/// from the running task.
pub(crate) struct Executor {
    /// Live tasks, indexed by `TaskId::index`.
    tasks: RefCell<Slab<Task>>,

    /// Tasks waiting to be polled.
    ready: Arc<ReadyQueue>,

    /// Next generation handed to a spawned task.
    generation: Cell<u64>,

    /// The non-preemption flag.
    critical: Cell<bool>,

    /// Task being polled, if any.
    current: Cell<Option<TaskId>>,
}

impl Executor {
    /// Creates an executor with room reserved for `task_capacity` tasks.
    pub(crate) fn new(task_capacity: usize) -> Self {
        Self {
            tasks: RefCell::new(Slab::with_capacity(task_capacity)),
            ready: Arc::new(ReadyQueue::new()),
            generation: Cell::new(0),
            critical: Cell::new(false),
            current: Cell::new(None),
        }
    }

    /// Spawns a future as a new task at the back of the ready queue.
    pub(crate) fn spawn<F>(self: &Rc<Self>, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let state = Rc::new(JoinState::new());
        let slot = state.clone();

        let future: TaskFuture = Box::pin(async move {
            slot.complete(future.await);
        });

        let id = {
            let mut tasks = self.tasks.borrow_mut();

            let generation = self.generation.get();
            self.generation.set(generation + 1);

            let id = TaskId {
                index: tasks.next_index(),
                generation,
            };

            let header = Arc::new(Header::new(id, self.ready.clone()));
            tasks.insert(Task {
                header,
                future: Some(future),
            });

            id
        };

        self.ready.push(id);
        debug!(task = %id, "task spawned");

        JoinHandle {
            id,
            state,
            executor: Rc::downgrade(self),
        }
    }

    /// Polls tasks until `handle` has produced its output.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Stalled`] if the ready queue runs dry while
    /// the task behind `handle` is still pending.
    pub(crate) fn run_until<T>(&self, handle: &JoinHandle<T>) -> Result<T, RuntimeError> {
        loop {
            if let Some(value) = handle.try_take() {
                return Ok(value);
            }

            let Some(id) = self.ready.pop() else {
                let suspended = self.tasks.borrow().len();
                error!(suspended, "no runnable task left");

                return Err(RuntimeError::Stalled { suspended });
            };

            self.poll_task(id);
        }
    }

    /// Polls one task.
    ///
    /// The future is taken out of its slot for the duration of the poll so
    /// the task can spawn, wake, or abort other tasks.
    fn poll_task(&self, id: TaskId) {
        let (header, mut future) = {
            let mut tasks = self.tasks.borrow_mut();

            let Some(task) = tasks.get_mut(id.index) else {
                return;
            };

            if task.header.id != id || !task.header.begin_poll() {
                return;
            }

            let Some(future) = task.future.take() else {
                return;
            };

            (task.header.clone(), future)
        };

        let waker = make_waker(header.clone());
        let mut cx = Context::from_waker(&waker);

        trace!(task = %id, "polling task");
        let poll = {
            self.current.set(Some(id));
            let _polling = Polling(&self.current);

            future.as_mut().poll(&mut cx)
        };

        match poll {
            Poll::Ready(()) => {
                header.complete();
                let finished = self.remove(id);

                drop(future);
                drop(finished);
                debug!(task = %id, "task completed");
            }
            Poll::Pending => {
                let orphan = self.restore(id, future);
                let requeued = header.end_poll();

                if self.critical.get() {
                    if requeued {
                        self.ready.promote(id);
                    } else {
                        warn!(task = %id, "task suspended inside a critical section");
                        self.critical.set(false);
                    }
                }

                // The task was aborted while it was being polled.
                drop(orphan);
            }
        }
    }

    /// Puts a polled future back into its slot.
    ///
    /// Returns the future if the slot no longer belongs to the task.
    fn restore(&self, id: TaskId, future: TaskFuture) -> Option<TaskFuture> {
        let mut tasks = self.tasks.borrow_mut();

        match tasks.get_mut(id.index) {
            Some(task) if task.header.id == id => {
                task.future = Some(future);
                None
            }
            _ => Some(future),
        }
    }

    /// Removes a task slot if it still belongs to `id`.
    fn remove(&self, id: TaskId) -> Option<Task> {
        let mut tasks = self.tasks.borrow_mut();
        let owned = tasks.get(id.index).is_some_and(|task| task.header.id == id);

        if owned { tasks.try_remove(id.index) } else { None }
    }

    /// Aborts a task, dropping its future.
    ///
    /// The future is dropped after the task table is released, so
    /// destructors may freely use the runtime.
    pub(crate) fn abort(&self, id: TaskId) {
        let Some(task) = self.remove(id) else {
            return;
        };

        task.header.cancel();
        debug!(task = %id, "task aborted");

        drop(task);
    }

    /// Resolves a live task id.
    pub(crate) fn header(&self, id: TaskId) -> Option<Arc<Header>> {
        let tasks = self.tasks.borrow();

        tasks
            .get(id.index)
            .filter(|task| task.header.id == id && task.header.is_alive())
            .map(|task| task.header.clone())
    }

    /// Moves `id` to the front of the ready queue.
    pub(crate) fn promote(&self, id: TaskId) {
        self.ready.promote(id);
    }

    /// Task being polled, if any.
    pub(crate) fn current_task(&self) -> Option<TaskId> {
        self.current.get()
    }

    pub(crate) fn is_critical(&self) -> bool {
        self.critical.get()
    }

    pub(crate) fn set_critical(&self, critical: bool) {
        self.critical.set(critical);
    }

    /// Number of tasks not yet completed or aborted.
    pub(crate) fn num_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Cancels every remaining task and drops their futures.
    ///
    /// All ids are invalidated before any future is dropped.
    pub(crate) fn shutdown(&self) {
        let tasks = self.tasks.borrow_mut().drain();

        for task in &tasks {
            task.header.cancel();
        }

        self.ready.clear();
        self.critical.set(false);

        if !tasks.is_empty() {
            debug!(count = tasks.len(), "dropping unfinished tasks");
        }

        drop(tasks);
    }
}

/// Clears the running task when a poll ends, even by unwinding.
struct Polling<'a>(&'a Cell<Option<TaskId>>);

impl Drop for Polling<'_> {
    fn drop(&mut self) {
        self.0.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::Executor;

    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    async fn explode() {
        panic!("task failed");
    }

    #[test]
    fn panicking_poll_clears_the_running_task() {
        let executor = Rc::new(Executor::new(0));
        let handle = executor.spawn(explode());

        let result = panic::catch_unwind(AssertUnwindSafe(|| executor.run_until(&handle)));

        assert!(result.is_err());
        assert_eq!(executor.current_task(), None);
    }

    #[test]
    fn stall_is_reported_with_the_suspended_count() {
        let executor = Rc::new(Executor::new(0));
        let handle = executor.spawn(std::future::pending::<()>());

        let result = executor.run_until(&handle);

        assert_eq!(
            result,
            Err(crate::error::RuntimeError::Stalled { suspended: 1 })
        );
        executor.shutdown();
    }
}
