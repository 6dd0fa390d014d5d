use super::{CriticalSection, Scheduler};
use crate::utils::Slab;

use std::cell::RefCell;
use std::{fmt, process, thread};

use tracing::{debug, error, trace};

/// A node of the live list.
struct Node<T> {
    value: T,
    next: Option<usize>,
}

/// A FIFO queue of waiters with pooled node storage.
///
/// Nodes live in a [`Slab`]: dequeued nodes return to the slab's free list
/// and are relinked by later enqueues, so a queue that cycles between empty
/// and busy stops allocating once it has seen its peak number of waiters.
///
/// `head` and `tail` are node indices; `head.is_none() == tail.is_none()`
/// always holds.
pub struct WaitQueue<T> {
    nodes: Slab<Node<T>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<T> WaitQueue<T> {
    /// Creates an empty queue. No storage is allocated until the first
    /// enqueue.
    pub const fn new() -> Self {
        Self {
            nodes: Slab::new(),
            head: None,
            tail: None,
        }
    }

    /// Appends `value` at the tail and returns the key of its node.
    ///
    /// The key identifies the entry until it leaves the queue; see
    /// [`remove`](Self::remove).
    pub fn enqueue(&mut self, value: T) -> usize {
        let index = self.nodes.insert(Node { value, next: None });

        match self.tail.and_then(|tail| self.nodes.get_mut(tail)) {
            Some(last) => last.next = Some(index),
            None => self.head = Some(index),
        }

        self.tail = Some(index);
        index
    }

    /// Returns the queued value stored under `key`, if it is still queued.
    pub fn get(&self, key: usize) -> Option<&T> {
        self.nodes.get(key).map(|node| &node.value)
    }

    /// Unlinks the entry stored under `key`, wherever it sits in the queue.
    ///
    /// The node returns to the pool. Returns `None` if `key` is not queued.
    pub fn remove(&mut self, key: usize) -> Option<T> {
        let mut prev = None;
        let mut cursor = self.head;

        while let Some(index) = cursor {
            if index == key {
                break;
            }

            prev = Some(index);
            cursor = self.nodes.get(index).and_then(|node| node.next);
        }

        cursor?;
        let node = self.nodes.remove(key);

        match prev.and_then(|index| self.nodes.get_mut(index)) {
            Some(before) => before.next = node.next,
            None => self.head = node.next,
        }

        if self.tail == Some(key) {
            self.tail = prev;
        }

        Some(node.value)
    }

    /// Removes and returns the oldest waiter, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<T> {
        let index = self.head?;
        let node = self.nodes.remove(index);

        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }

        Some(node.value)
    }

    /// Returns the oldest waiter without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.head
            .and_then(|index| self.nodes.get(index))
            .map(|node| &node.value)
    }

    /// Number of live waiters.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no waiter is queued.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of nodes allocated so far, live or pooled.
    ///
    /// This is the high-water mark of simultaneous waiters.
    pub fn capacity(&self) -> usize {
        self.nodes.slots()
    }

    /// Iterates over live waiters, oldest first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            next: self.head,
        }
    }

    /// Calls `visitor` on every live waiter, oldest first.
    ///
    /// This is the root-scanning entry point for hosts that need to see
    /// every handle the queue keeps alive.
    pub fn for_each_live(&self, visitor: impl FnMut(&T)) {
        self.iter().for_each(visitor);
    }

    /// Frees every node, live and pooled.
    ///
    /// # Panics
    ///
    /// Panics if waiters are still queued: they could never be woken.
    pub fn release_all_storage(&mut self) {
        assert!(
            self.is_empty(),
            "invariant violation: wait queue storage released with {} waiter(s) queued",
            self.len()
        );

        self.nodes.clear();
    }
}

impl<T: Clone + fmt::Debug> WaitQueue<T> {
    /// Wakes the oldest live waiter.
    ///
    /// Waiters are dequeued until the scheduler accepts one; waiters the
    /// scheduler reports as dead are dropped from the queue. Returns the
    /// woken waiter, or `None` once the queue is exhausted.
    pub fn wake_one<S>(&mut self, scheduler: &S) -> Option<T>
    where
        S: Scheduler<Task = T>,
    {
        while let Some(task) = self.dequeue() {
            match scheduler.mark_runnable(&task) {
                Ok(()) => {
                    trace!(task = ?task, "waiter marked runnable");
                    return Some(task);
                }
                Err(_) => debug!(task = ?task, "skipping dead waiter"),
            }
        }

        None
    }

    /// Wakes every live waiter and empties the queue.
    ///
    /// Returns the number of waiters actually woken.
    pub fn wake_all<S>(&mut self, scheduler: &S) -> usize
    where
        S: Scheduler<Task = T>,
    {
        let mut woken = 0;

        while self.wake_one(scheduler).is_some() {
            woken += 1;
        }

        woken
    }

    /// Tears the queue down when the primitive owning it is dropped.
    ///
    /// Dead waiters are discarded silently.
    ///
    /// # Panics
    ///
    /// Panics if a live waiter is still queued: nothing could ever wake it.
    pub(crate) fn retire<S>(&mut self, scheduler: &S, owner: &str)
    where
        S: Scheduler<Task = T>,
    {
        let live = self.iter().filter(|task| scheduler.is_alive(task)).count();

        if live > 0 {
            error!(owner, live, "dropped with live waiters");

            // A second panic while unwinding cannot be reported; stop here.
            if thread::panicking() {
                process::abort();
            }

            panic!("invariant violation: {owner} dropped with {live} task(s) waiting");
        }

        while self.dequeue().is_some() {}
        self.release_all_storage();
    }
}

/// The entry a suspended task holds in a [`WaitQueue`].
///
/// A `Waiter` lives across the `.await` in which its task is parked and is
/// disarmed once the task resumes. Dropping it armed means the waiting
/// future itself was dropped: the entry is unlinked, or, if a wakeup
/// already dequeued it, that wakeup is passed on to the next waiter.
pub(crate) struct Waiter<'a, S: Scheduler> {
    queue: &'a RefCell<WaitQueue<S::Task>>,
    scheduler: &'a S,
    key: usize,
    task: S::Task,
    armed: bool,
}

impl<'a, S: Scheduler> Waiter<'a, S> {
    pub(crate) fn new(
        queue: &'a RefCell<WaitQueue<S::Task>>,
        scheduler: &'a S,
        key: usize,
        task: S::Task,
    ) -> Self {
        Self {
            queue,
            scheduler,
            key,
            task,
            armed: true,
        }
    }

    /// Marks the wait as finished; dropping no longer touches the queue.
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: Scheduler> Drop for Waiter<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let _critical = CriticalSection::enter(self.scheduler);
        let mut queue = self.queue.borrow_mut();

        if queue.get(self.key) == Some(&self.task) {
            queue.remove(self.key);
            trace!(task = ?self.task, "waiter left the queue");
        } else if let Some(next) = queue.wake_one(self.scheduler) {
            debug!(task = ?self.task, next = ?next, "passing wakeup on");
        }
    }
}

impl<T> Default for WaitQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for WaitQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over the live waiters of a [`WaitQueue`].
pub struct Iter<'a, T> {
    queue: &'a WaitQueue<T>,
    next: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.queue.nodes.get(self.next?)?;
        self.next = node.next;

        Some(&node.value)
    }
}

impl<'a, T> IntoIterator for &'a WaitQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
