use super::context;
use super::executor::Executor;
use super::task::JoinHandle;
use crate::error::RuntimeError;

use std::future::Future;
use std::rc::Rc;

use tracing::debug_span;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning tasks onto its single-threaded executor,
/// - driving them cooperatively, one at a time, on the calling thread,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// A runtime is neither `Send` nor `Sync`; its tasks never leave the
/// thread that created it. Dropping the runtime drops every unfinished
/// task.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Rc<Executor>,

    /// Name recorded on the runtime's tracing span.
    name: String,
}

impl Runtime {
    /// Creates a new runtime instance.
    pub(crate) fn new(task_capacity: usize, name: String) -> Self {
        Self {
            executor: Rc::new(Executor::new(task_capacity)),
            name,
        }
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task first runs during the next call to
    /// [`block_on`](Self::block_on).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 1 + 1 });
    /// assert_eq!(runtime.block_on(handle), 2);
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.executor.spawn(future)
    }

    /// Runs a future to completion as a task, driving every other task
    /// in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Stalled`] if every task is suspended and
    /// nothing is left to wake `future`.
    pub fn try_block_on<F>(&self, future: F) -> Result<F::Output, RuntimeError>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let span = debug_span!("runtime", name = %self.name);
        let _enter = span.enter();

        context::enter_context(self.executor.clone(), || {
            let handle = self.executor.spawn(future);
            self.executor.run_until(&handle)
        })
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is typically used as the synchronous entry point
    /// of the runtime (e.g. in `main` or tests).
    ///
    /// # Panics
    ///
    /// Panics if the runtime stalls before the future completes, which
    /// happens when every task waits on a primitive nobody will signal.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        match self.try_block_on(future) {
            Ok(output) => output,
            Err(err) => panic!("block_on failed: {err}"),
        }
    }

    /// Number of tasks spawned on this runtime that have neither
    /// completed nor been aborted.
    pub fn num_tasks(&self) -> usize {
        self.executor.num_tasks()
    }

    /// Name given by [`RuntimeBuilder::name`](crate::RuntimeBuilder::name).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Runtime {
    /// Cancels and drops every unfinished task.
    ///
    /// The executor stays installed while the futures drop, so
    /// primitives owned by those tasks can still resolve task ids.
    fn drop(&mut self) {
        let span = debug_span!("runtime", name = %self.name);
        let _enter = span.enter();

        context::enter_context(self.executor.clone(), || self.executor.shutdown());
    }
}
