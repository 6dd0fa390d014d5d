use super::wait_queue::Waiter;
use super::{CriticalSection, Scheduler, WaitQueue};
use crate::error::LockError;
use crate::runtime::Current;

use std::cell::RefCell;
use std::fmt;
use std::future::Future;

use tracing::debug;

/// A mutual exclusion lock for cooperative tasks.
///
/// A `Mutex` records which task owns it and queues contending tasks in
/// FIFO order. It does not wrap data: like a classic green-thread mutex it
/// is locked and unlocked explicitly, or scoped with
/// [`synchronize`](Self::synchronize).
///
/// Locking is not reentrant. A task that locks a mutex it already owns
/// gets [`LockError::Deadlock`] instead of suspending forever.
///
/// Every check-then-set on the owner runs inside a [`CriticalSection`], so
/// no other task can observe a half-updated mutex.
///
/// # Examples
///
/// ```rust,ignore
/// let mutex = Rc::new(Mutex::new());
///
/// mutex.lock().await?;
/// // critical work
/// mutex.unlock().await;
/// ```
pub struct Mutex<S: Scheduler = Current> {
    /// Task currently holding the lock; `None` when unlocked.
    owner: RefCell<Option<S::Task>>,

    /// Tasks blocked in `lock`, oldest first.
    waiting: RefCell<WaitQueue<S::Task>>,

    scheduler: S,
}

impl Mutex {
    /// Creates an unlocked mutex bound to the runtime entered on this
    /// thread.
    pub fn new() -> Self {
        Self::with_scheduler(Current)
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> Mutex<S> {
    /// Creates an unlocked mutex driven by `scheduler`.
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            owner: RefCell::new(None),
            waiting: RefCell::new(WaitQueue::new()),
            scheduler,
        }
    }

    /// Returns `true` if some task holds the lock.
    pub fn is_locked(&self) -> bool {
        self.owner.borrow().is_some()
    }

    /// Returns the task holding the lock, if any.
    pub fn owner(&self) -> Option<S::Task> {
        self.owner.borrow().clone()
    }

    /// Returns `true` if the running task holds the lock.
    pub fn is_held_by_current(&self) -> bool {
        self.is_owned_by(&self.scheduler.current_task())
    }

    /// Number of tasks queued in [`lock`](Self::lock).
    ///
    /// Tasks that died while queued are counted until a hand-off skips them.
    pub fn num_waiting(&self) -> usize {
        self.waiting.borrow().len()
    }

    /// Snapshot of the queued tasks, oldest first.
    pub fn waiters(&self) -> Vec<S::Task> {
        self.waiting.borrow().iter().cloned().collect()
    }

    /// Visits every task handle this mutex keeps: the owner, then the
    /// queued waiters.
    pub fn for_each_live(&self, mut visitor: impl FnMut(&S::Task)) {
        if let Some(owner) = self.owner.borrow().as_ref() {
            visitor(owner);
        }

        self.waiting.borrow().for_each_live(visitor);
    }

    /// Attempts to take the lock without suspending.
    ///
    /// Returns `true` if the running task now owns the mutex.
    pub fn try_lock(&self) -> bool {
        let _critical = CriticalSection::enter(&self.scheduler);

        let mut owner = self.owner.borrow_mut();
        if owner.is_some() {
            return false;
        }

        *owner = Some(self.scheduler.current_task());
        true
    }

    /// Acquires the lock, suspending while another task holds it.
    ///
    /// The running task is queued behind earlier waiters and re-checks
    /// ownership every time it resumes: a wakeup only makes a task
    /// runnable, so another task may have taken the lock in between.
    ///
    /// Dropping the returned future while it waits gives up the task's
    /// place in the queue; a wakeup it already received goes to the next
    /// waiter.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Deadlock`] if the running task already owns
    /// the mutex. The task does not suspend in that case.
    pub async fn lock(&self) -> Result<(), LockError> {
        let current = self.scheduler.current_task();

        loop {
            let key = {
                let _critical = CriticalSection::enter(&self.scheduler);
                let holder = self.owner.borrow().clone();

                match holder {
                    None => {
                        *self.owner.borrow_mut() = Some(current);
                        return Ok(());
                    }
                    Some(holder) if holder == current => return Err(LockError::Deadlock),
                    Some(_) => self.waiting.borrow_mut().enqueue(current.clone()),
                }
            };

            let waiter = Waiter::new(&self.waiting, &self.scheduler, key, current.clone());
            self.scheduler.suspend_current().await;
            waiter.disarm();
        }
    }

    /// Releases the lock and hands the CPU to the next live waiter.
    ///
    /// Does nothing if the mutex is not locked. Waiters that died while
    /// queued are skipped. The lock itself is not transferred: the woken
    /// task competes for it again when it resumes.
    pub async fn unlock(&self) {
        let woken = {
            let _critical = CriticalSection::enter(&self.scheduler);

            if !self.is_locked() {
                return;
            }

            self.release()
        };

        self.run_woken(woken).await;
    }

    /// Releases the lock, then runs `action` with preemption disabled.
    ///
    /// The next waiter is woken but not switched to, so no other task runs
    /// before `action` returns. The critical flag is restored on every exit
    /// path, including a panic in `action`.
    ///
    /// Returns `None` without running `action` if the mutex is not locked.
    pub fn exclusive_unlock_around<R>(&self, action: impl FnOnce() -> R) -> Option<R> {
        let _critical = CriticalSection::enter(&self.scheduler);

        if !self.is_locked() {
            return None;
        }

        self.release();
        Some(action())
    }

    /// Runs `action` while holding the lock.
    ///
    /// The lock is released when `action` completes, and also if it
    /// panics or the returned future is dropped before completion.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Deadlock`] if the running task already owns
    /// the mutex; `action` is not run.
    pub async fn synchronize<F, Fut, R>(&self, action: F) -> Result<R, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.lock().await?;

        let held = Held {
            mutex: self,
            holder: self.scheduler.current_task(),
            armed: true,
        };

        let out = action().await;
        held.unlock().await;

        Ok(out)
    }

    /// Returns `true` if `task` holds the lock.
    pub(crate) fn is_owned_by(&self, task: &S::Task) -> bool {
        self.owner.borrow().as_ref() == Some(task)
    }

    /// Clears the owner and wakes the next live waiter.
    ///
    /// Must be called inside a critical section.
    pub(crate) fn release(&self) -> Option<S::Task> {
        self.owner.borrow_mut().take();
        self.waiting.borrow_mut().wake_one(&self.scheduler)
    }

    async fn run_woken(&self, woken: Option<S::Task>) {
        let Some(task) = woken else {
            return;
        };

        if self.scheduler.run_and_yield(&task).await.is_err() {
            debug!(task = ?task, "woken waiter died before it could run");
        }
    }
}

impl<S: Scheduler> Drop for Mutex<S> {
    /// # Panics
    ///
    /// Panics if a live task is still queued on the mutex.
    fn drop(&mut self) {
        self.waiting.get_mut().retire(&self.scheduler, "mutex");
    }
}

impl<S: Scheduler> fmt::Debug for Mutex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("owner", &self.owner.borrow())
            .field("waiting", &self.waiting.borrow())
            .finish()
    }
}

/// Releases a mutex taken by [`Mutex::synchronize`] if the action does not
/// complete normally.
struct Held<'a, S: Scheduler> {
    mutex: &'a Mutex<S>,
    holder: S::Task,
    armed: bool,
}

impl<S: Scheduler> Held<'_, S> {
    async fn unlock(mut self) {
        self.armed = false;

        let woken = {
            let _critical = CriticalSection::enter(&self.mutex.scheduler);

            if !self.mutex.is_owned_by(&self.holder) {
                return;
            }

            self.mutex.release()
        };

        self.mutex.run_woken(woken).await;
    }
}

impl<S: Scheduler> Drop for Held<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let _critical = CriticalSection::enter(&self.mutex.scheduler);
        if self.mutex.is_owned_by(&self.holder) {
            self.mutex.release();
        }
    }
}
