use crate::runtime::task::TaskId;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of tasks waiting to be polled.
///
/// Wakers may be cloned and stored anywhere, so pushes go through a
/// `Mutex` even though the executor itself drives every task from one
/// thread.
pub(crate) struct ReadyQueue {
    queue: Mutex<VecDeque<TaskId>>,
}

impl ReadyQueue {
    /// Creates an empty ready queue.
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TaskId>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a task at the back of the queue.
    pub(crate) fn push(&self, id: TaskId) {
        self.lock().push_back(id);
    }

    /// Moves `id` to the front of the queue so it is polled next.
    ///
    /// The task is inserted if it was not queued.
    pub(crate) fn promote(&self, id: TaskId) {
        let mut queue = self.lock();

        if let Some(pos) = queue.iter().position(|queued| *queued == id) {
            queue.remove(pos);
        }

        queue.push_front(id);
    }

    /// Takes the task at the front of the queue.
    pub(crate) fn pop(&self) -> Option<TaskId> {
        self.lock().pop_front()
    }

    /// Drops every queued id.
    pub(crate) fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::ReadyQueue;
    use crate::runtime::task::TaskId;

    fn id(index: usize) -> TaskId {
        TaskId {
            index,
            generation: index as u64,
        }
    }

    #[test]
    fn promote_moves_task_to_front() {
        let ready = ReadyQueue::new();
        ready.push(id(1));
        ready.push(id(2));
        ready.push(id(3));

        ready.promote(id(3));
        ready.promote(id(7));

        assert_eq!(ready.pop(), Some(id(7)));
        assert_eq!(ready.pop(), Some(id(3)));
        assert_eq!(ready.pop(), Some(id(1)));
        assert_eq!(ready.pop(), Some(id(2)));
        assert_eq!(ready.pop(), None);
    }
}
