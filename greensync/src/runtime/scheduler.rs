use super::context;
use super::task::{Header, TaskId};
use super::yield_now::yield_now;
use crate::error::TaskDead;
use crate::sync::Scheduler;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tracing::trace;

/// The scheduler of the runtime driving the calling thread.
///
/// `Current` is a zero-sized handle: every call resolves the executor
/// installed by [`Runtime::block_on`](crate::Runtime::block_on). It is the
/// default scheduler of [`Mutex`](crate::Mutex),
/// [`ConditionVariable`](crate::ConditionVariable) and
/// [`Queue`](crate::Queue).
///
/// Outside a runtime no task can be woken: [`mark_runnable`] reports
/// [`TaskDead`], the critical flag reads `false`, and suspending returns
/// immediately. This keeps primitives safe to drop after their runtime.
///
/// [`mark_runnable`]: Scheduler::mark_runnable
#[derive(Debug, Clone, Copy, Default)]
pub struct Current;

impl Scheduler for Current {
    type Task = TaskId;

    /// # Panics
    ///
    /// Panics if called outside a task running on a runtime.
    fn current_task(&self) -> TaskId {
        context::current_executor()
            .and_then(|executor| executor.current_task())
            .expect("current_task must be called from a task running on a runtime")
    }

    fn suspend_current(&self) -> impl Future<Output = ()> {
        Park { header: None }
    }

    fn mark_runnable(&self, task: &TaskId) -> Result<(), TaskDead> {
        let header = context::current_executor()
            .and_then(|executor| executor.header(*task))
            .ok_or(TaskDead)?;

        trace!(task = %task, "marking task runnable");
        header.unpark();

        Ok(())
    }

    async fn run_and_yield(&self, task: &TaskId) -> Result<(), TaskDead> {
        self.mark_runnable(task)?;

        if let Some(executor) = context::current_executor() {
            executor.promote(*task);
        }

        yield_now().await;
        Ok(())
    }

    async fn yield_to_scheduler(&self) {
        yield_now().await;
    }

    fn is_alive(&self, task: &TaskId) -> bool {
        context::current_executor().is_some_and(|executor| executor.header(*task).is_some())
    }

    fn is_critical(&self) -> bool {
        context::current_executor().is_some_and(|executor| executor.is_critical())
    }

    fn set_critical(&self, critical: bool) {
        if let Some(executor) = context::current_executor() {
            executor.set_critical(critical);
        }
    }
}

/// Future returned by [`Current::suspend_current`].
///
/// It completes only once the task has been granted an unpark permit
/// after it started waiting; plain wakeups leave it pending.
struct Park {
    header: Option<Arc<Header>>,
}

impl Future for Park {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if let Some(header) = &self.header {
            return if header.take_unpark() {
                Poll::Ready(())
            } else {
                Poll::Pending
            };
        }

        let header = context::current_executor().and_then(|executor| {
            let id = executor.current_task()?;
            executor.header(id)
        });

        let Some(header) = header else {
            return Poll::Ready(());
        };

        // A permit granted before this wait started is stale.
        header.take_unpark();
        trace!(task = %header.id, "task suspended");

        self.header = Some(header);
        Poll::Pending
    }
}
