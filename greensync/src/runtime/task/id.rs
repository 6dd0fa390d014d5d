use std::fmt;

/// Identifier of a task spawned on a [`Runtime`](crate::Runtime).
///
/// A `TaskId` is a non-owning handle: it stays valid to hold after the task
/// finishes or is aborted, and from then on simply resolves to nothing.
/// Slots are reused, so the id pairs the slot index with a generation that
/// is never handed out twice by the same runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}.{}", self.index, self.generation)
    }
}
