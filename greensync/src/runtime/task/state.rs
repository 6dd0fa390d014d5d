/// Task is suspended and not scheduled.
///
/// The task exists but is neither in the ready queue nor running.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
///
/// The task id sits in the ready queue waiting to be polled.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled.
///
/// At most one task observes this state at a time.
pub(crate) const RUNNING: usize = 2;

/// Task has completed execution.
///
/// The future has returned `Poll::Ready` and will not be polled again.
pub(crate) const COMPLETED: usize = 3;

/// Task has been woken while running.
///
/// The task goes back to the ready queue as soon as its current poll
/// returns `Poll::Pending`.
pub(crate) const NOTIFIED: usize = 4;

/// Task has been aborted.
///
/// Its future has been dropped and its id no longer resolves.
pub(crate) const CANCELLED: usize = 5;
