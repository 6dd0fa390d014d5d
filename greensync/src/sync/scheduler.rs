use crate::error::TaskDead;

use std::fmt;
use std::future::Future;

/// The scheduler services the synchronization primitives rely on.
///
/// Implementations describe a cooperative, single-active-task scheduler:
/// exactly one task runs at a time and control only changes hands at
/// `.await` points. The primitives never touch a hardware lock; they make
/// multi-step updates atomic by raising the critical flag, which forbids the
/// scheduler from switching away from the running task.
///
/// [`Current`](crate::Current) implements this trait for the bundled
/// runtime.
pub trait Scheduler {
    /// Non-owning handle to a task.
    ///
    /// A handle outlives its task without dangling: once the task is gone,
    /// [`mark_runnable`](Self::mark_runnable) reports [`TaskDead`].
    type Task: Clone + Eq + fmt::Debug;

    /// Returns the task currently running.
    fn current_task(&self) -> Self::Task;

    /// Parks the calling task until another task marks it runnable.
    fn suspend_current(&self) -> impl Future<Output = ()>;

    /// Wakes `task` without switching to it.
    fn mark_runnable(&self, task: &Self::Task) -> Result<(), TaskDead>;

    /// Wakes `task` and immediately hands it the CPU.
    fn run_and_yield(&self, task: &Self::Task) -> impl Future<Output = Result<(), TaskDead>>;

    /// Yields to whichever task the scheduler picks next.
    fn yield_to_scheduler(&self) -> impl Future<Output = ()>;

    /// Returns `true` while `task` can still be woken.
    fn is_alive(&self, task: &Self::Task) -> bool;

    /// Reads the critical (non-preemption) flag.
    fn is_critical(&self) -> bool;

    /// Writes the critical (non-preemption) flag.
    fn set_critical(&self, critical: bool);
}

/// Scoped non-preemption.
///
/// Entering raises the scheduler's critical flag; dropping the guard puts
/// back whatever value the flag had before, on every exit path including
/// early returns and unwinding.
///
/// A critical section must never be held across an `.await`.
#[must_use = "the critical section ends as soon as the guard is dropped"]
pub struct CriticalSection<'a, S: Scheduler> {
    scheduler: &'a S,
    prior: bool,
}

impl<'a, S: Scheduler> CriticalSection<'a, S> {
    /// Raises the critical flag until the returned guard is dropped.
    pub fn enter(scheduler: &'a S) -> Self {
        let prior = scheduler.is_critical();
        scheduler.set_critical(true);

        Self { scheduler, prior }
    }
}

impl<S: Scheduler> Drop for CriticalSection<'_, S> {
    fn drop(&mut self) {
        self.scheduler.set_critical(self.prior);
    }
}
