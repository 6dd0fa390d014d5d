use super::wait_queue::Waiter;
use super::{CriticalSection, Mutex, Scheduler, WaitQueue};
use crate::error::LockError;
use crate::runtime::Current;

use std::cell::RefCell;
use std::fmt;

/// A condition variable for cooperative tasks.
///
/// Tasks park on a `ConditionVariable` while temporarily giving up a
/// [`Mutex`], and are woken in FIFO order by [`signal`](Self::signal) or
/// [`broadcast`](Self::broadcast). The condition variable is not tied to a
/// particular mutex; each [`wait`](Self::wait) names the one to release.
///
/// Wakeups carry no payload, so callers should re-check their predicate
/// in a loop:
///
/// ```rust,ignore
/// mutex.lock().await?;
/// while !ready.get() {
///     cond.wait(&mutex).await?;
/// }
/// mutex.unlock().await;
/// ```
pub struct ConditionVariable<S: Scheduler = Current> {
    /// Tasks parked in `wait`, oldest first.
    waiting: RefCell<WaitQueue<S::Task>>,

    scheduler: S,
}

impl ConditionVariable {
    /// Creates a condition variable bound to the runtime entered on this
    /// thread.
    pub fn new() -> Self {
        Self::with_scheduler(Current)
    }
}

impl Default for ConditionVariable {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> ConditionVariable<S> {
    /// Creates a condition variable driven by `scheduler`.
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            waiting: RefCell::new(WaitQueue::new()),
            scheduler,
        }
    }

    /// Releases `mutex`, parks until signalled, then locks `mutex` again.
    ///
    /// The running task is queued on this condition variable before the
    /// mutex is released, so a signal sent by the next holder of the mutex
    /// cannot be missed. Releasing the mutex wakes its next waiter.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::NotOwner`] if the running task does not hold
    /// `mutex`. Nothing is released or queued in that case.
    pub async fn wait(&self, mutex: &Mutex<S>) -> Result<(), LockError> {
        let current = self.scheduler.current_task();

        let key = {
            let _critical = CriticalSection::enter(&self.scheduler);

            if !mutex.is_owned_by(&current) {
                return Err(LockError::NotOwner);
            }

            let key = self.waiting.borrow_mut().enqueue(current.clone());
            mutex.release();
            key
        };

        let waiter = Waiter::new(&self.waiting, &self.scheduler, key, current);
        self.scheduler.suspend_current().await;
        waiter.disarm();

        mutex.lock().await
    }

    /// Wakes the oldest parked task, then yields.
    ///
    /// Tasks that died while parked are skipped. Does nothing but yield
    /// when no task is parked.
    pub async fn signal(&self) {
        {
            let _critical = CriticalSection::enter(&self.scheduler);
            self.waiting.borrow_mut().wake_one(&self.scheduler);
        }

        self.scheduler.yield_to_scheduler().await;
    }

    /// Wakes every parked task, then yields.
    pub async fn broadcast(&self) {
        {
            let _critical = CriticalSection::enter(&self.scheduler);
            self.waiting.borrow_mut().wake_all(&self.scheduler);
        }

        self.scheduler.yield_to_scheduler().await;
    }

    /// Number of tasks parked in [`wait`](Self::wait).
    pub fn num_waiting(&self) -> usize {
        self.waiting.borrow().len()
    }

    /// Visits every parked task handle, oldest first.
    pub fn for_each_live(&self, visitor: impl FnMut(&S::Task)) {
        self.waiting.borrow().for_each_live(visitor);
    }
}

impl<S: Scheduler> Drop for ConditionVariable<S> {
    /// # Panics
    ///
    /// Panics if a live task is still parked on the condition variable.
    fn drop(&mut self) {
        self.waiting
            .get_mut()
            .retire(&self.scheduler, "condition variable");
    }
}

impl<S: Scheduler> fmt::Debug for ConditionVariable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionVariable")
            .field("waiting", &self.waiting.borrow())
            .finish()
    }
}
