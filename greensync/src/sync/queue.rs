use super::wait_queue::Waiter;
use super::{CriticalSection, Scheduler, WaitQueue};
use crate::runtime::Current;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

/// An unbounded FIFO queue for handing values between tasks.
///
/// [`pop`](Self::pop) suspends while the queue is empty; [`push`](Self::push)
/// wakes the oldest blocked consumer and switches to it. Items and blocked
/// consumers are both served in FIFO order.
pub struct Queue<T, S: Scheduler = Current> {
    items: RefCell<VecDeque<T>>,

    /// Consumers blocked in `pop`, oldest first.
    waiting: RefCell<WaitQueue<S::Task>>,

    scheduler: S,
}

impl<T> Queue<T> {
    /// Creates an empty queue bound to the runtime entered on this thread.
    pub fn new() -> Self {
        Self::with_scheduler(Current)
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Scheduler> Queue<T, S> {
    /// Creates an empty queue driven by `scheduler`.
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            items: RefCell::new(VecDeque::new()),
            waiting: RefCell::new(WaitQueue::new()),
            scheduler,
        }
    }

    /// Appends `item` and hands the CPU to the oldest blocked consumer.
    pub async fn push(&self, item: T) {
        let woken = {
            let _critical = CriticalSection::enter(&self.scheduler);

            self.items.borrow_mut().push_back(item);
            self.waiting.borrow_mut().wake_one(&self.scheduler)
        };

        let Some(task) = woken else {
            return;
        };

        if self.scheduler.run_and_yield(&task).await.is_err() {
            debug!(task = ?task, "woken consumer died before it could run");
        }
    }

    /// Removes the oldest item, suspending until one is available.
    pub async fn pop(&self) -> T {
        loop {
            let (key, current) = {
                let _critical = CriticalSection::enter(&self.scheduler);

                if let Some(item) = self.items.borrow_mut().pop_front() {
                    return item;
                }

                let current = self.scheduler.current_task();
                (self.waiting.borrow_mut().enqueue(current.clone()), current)
            };

            let waiter = Waiter::new(&self.waiting, &self.scheduler, key, current);
            self.scheduler.suspend_current().await;
            waiter.disarm();
        }
    }

    /// Removes the oldest item without suspending.
    pub fn try_pop(&self) -> Option<T> {
        let _critical = CriticalSection::enter(&self.scheduler);
        self.items.borrow_mut().pop_front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns `true` if no item is queued.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Number of consumers blocked in [`pop`](Self::pop).
    pub fn num_waiting(&self) -> usize {
        self.waiting.borrow().len()
    }

    /// Drops every queued item.
    pub fn clear(&self) {
        let _critical = CriticalSection::enter(&self.scheduler);
        self.items.borrow_mut().clear();
    }
}

impl<T, S: Scheduler> Drop for Queue<T, S> {
    /// # Panics
    ///
    /// Panics if a live consumer is still blocked in `pop`.
    fn drop(&mut self) {
        self.waiting.get_mut().retire(&self.scheduler, "queue");
    }
}

impl<T: fmt::Debug, S: Scheduler> fmt::Debug for Queue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("items", &self.items.borrow())
            .field("waiting", &self.waiting.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Queue;
    use crate::sync::testing::{MockScheduler, poll_once, run_ready};

    use std::pin::pin;
    use std::task::Poll;

    #[test]
    fn items_come_out_in_push_order() {
        let sched = MockScheduler::new();
        let queue = Queue::with_scheduler(sched.clone());

        for c in ["a", "b", "c"] {
            run_ready(queue.push(c));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(run_ready(queue.pop()), "a");
        assert_eq!(queue.try_pop(), Some("b"));
        assert_eq!(run_ready(queue.pop()), "c");
        assert_eq!(queue.try_pop(), None);
        assert!(sched.ran().is_empty());
    }

    #[test]
    fn push_wakes_blocked_consumer() {
        let sched = MockScheduler::new();
        let queue = Queue::with_scheduler(sched.clone());

        sched.switch_to(1);
        let mut consumer = pin!(queue.pop());
        assert!(poll_once(consumer.as_mut()).is_pending());
        assert_eq!(queue.num_waiting(), 1);

        sched.switch_to(2);
        run_ready(queue.push(42));
        assert_eq!(sched.woken(), vec![1]);
        assert_eq!(sched.ran(), vec![1]);

        sched.switch_to(1);
        assert_eq!(poll_once(consumer.as_mut()), Poll::Ready(42));
        assert!(queue.is_empty());
    }

    #[test]
    fn push_skips_dead_consumers() {
        let sched = MockScheduler::new();
        let queue = Queue::with_scheduler(sched.clone());

        let mut consumers = Vec::new();
        for task in 1..=2 {
            sched.switch_to(task);
            let mut fut = Box::pin(queue.pop());
            assert!(poll_once(fut.as_mut()).is_pending());
            consumers.push(fut);
        }
        sched.kill(1);

        sched.switch_to(3);
        run_ready(queue.push('x'));

        assert_eq!(sched.woken(), vec![2]);
        assert_eq!(queue.num_waiting(), 0);
    }

    #[test]
    fn dropped_pop_future_gives_up_its_place() {
        let sched = MockScheduler::new();
        let queue = Queue::with_scheduler(sched.clone());

        sched.switch_to(1);
        let mut quitter = Box::pin(queue.pop());
        assert!(poll_once(quitter.as_mut()).is_pending());

        sched.switch_to(2);
        let mut consumer = Box::pin(queue.pop());
        assert!(poll_once(consumer.as_mut()).is_pending());

        drop(quitter);
        assert_eq!(queue.num_waiting(), 1);

        sched.switch_to(3);
        run_ready(queue.push(7));
        assert_eq!(sched.woken(), vec![2]);

        sched.switch_to(2);
        assert_eq!(poll_once(consumer.as_mut()), Poll::Ready(7));
    }

    #[test]
    fn clear_drops_items() {
        let sched = MockScheduler::new();
        let queue = Queue::with_scheduler(sched);

        run_ready(queue.push(1));
        run_ready(queue.push(2));
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(format!("{queue:?}"), "Queue { items: [], waiting: [] }");
    }
}
