//! Deterministic scheduler used by the unit tests of this module.

use super::Scheduler;
use crate::error::TaskDead;

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::future::{self, Future};
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct Inner {
    current: Cell<u32>,
    dead: RefCell<HashSet<u32>>,
    woken: RefCell<Vec<u32>>,
    ran: RefCell<Vec<u32>>,
    yields: Cell<usize>,
    critical: Cell<bool>,
    wakes_outside_critical: Cell<usize>,
}

/// A scheduler whose tasks are plain numbers switched by hand.
#[derive(Clone, Default)]
pub(crate) struct MockScheduler {
    inner: Rc<Inner>,
}

impl MockScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes `task` the running task.
    pub(crate) fn switch_to(&self, task: u32) {
        self.inner.current.set(task);
    }

    pub(crate) fn kill(&self, task: u32) {
        self.inner.dead.borrow_mut().insert(task);
    }

    /// Tasks successfully marked runnable, in order.
    pub(crate) fn woken(&self) -> Vec<u32> {
        self.inner.woken.borrow().clone()
    }

    /// Tasks handed the CPU through `run_and_yield`, in order.
    pub(crate) fn ran(&self) -> Vec<u32> {
        self.inner.ran.borrow().clone()
    }

    pub(crate) fn yields(&self) -> usize {
        self.inner.yields.get()
    }

    /// Whether every wakeup so far happened inside a critical section.
    pub(crate) fn woke_inside_critical(&self) -> bool {
        self.inner.wakes_outside_critical.get() == 0
    }
}

/// Returns `Pending` once, then completes.
struct ParkOnce(bool);

impl Future for ParkOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }

        self.0 = true;
        Poll::Pending
    }
}

impl Scheduler for MockScheduler {
    type Task = u32;

    fn current_task(&self) -> u32 {
        self.inner.current.get()
    }

    fn suspend_current(&self) -> impl Future<Output = ()> {
        ParkOnce(false)
    }

    fn mark_runnable(&self, task: &u32) -> Result<(), TaskDead> {
        if !self.is_alive(task) {
            return Err(TaskDead);
        }

        if !self.inner.critical.get() {
            let count = self.inner.wakes_outside_critical.get();
            self.inner.wakes_outside_critical.set(count + 1);
        }
        self.inner.woken.borrow_mut().push(*task);

        Ok(())
    }

    fn run_and_yield(&self, task: &u32) -> impl Future<Output = Result<(), TaskDead>> {
        let result = if self.is_alive(task) {
            self.inner.ran.borrow_mut().push(*task);
            Ok(())
        } else {
            Err(TaskDead)
        };

        future::ready(result)
    }

    fn yield_to_scheduler(&self) -> impl Future<Output = ()> {
        self.inner.yields.set(self.inner.yields.get() + 1);
        future::ready(())
    }

    fn is_alive(&self, task: &u32) -> bool {
        !self.inner.dead.borrow().contains(task)
    }

    fn is_critical(&self) -> bool {
        self.inner.critical.get()
    }

    fn set_critical(&self, critical: bool) {
        self.inner.critical.set(critical);
    }
}

/// Polls `future` once with a no-op waker.
pub(crate) fn poll_once<F: Future>(future: Pin<&mut F>) -> Poll<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    future.poll(&mut cx)
}

/// Drives a future that is expected to complete without suspending.
pub(crate) fn run_ready<F: Future>(future: F) -> F::Output {
    let future = pin!(future);

    match poll_once(future) {
        Poll::Ready(value) => value,
        Poll::Pending => panic!("future suspended unexpectedly"),
    }
}
