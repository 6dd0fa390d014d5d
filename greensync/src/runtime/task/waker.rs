use super::core::Header;

use std::mem;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// The `RawWakerVTable` for task wakers.
///
/// Every entry operates on a pointer obtained from `Arc::into_raw` on the
/// task's [`Header`].
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates a [`Waker`] that puts the task back on the ready queue.
///
/// Waking does not grant the task permission to leave
/// `suspend_current`; only `mark_runnable` does.
pub(crate) fn make_waker(header: Arc<Header>) -> Waker {
    // Safety: the pointer comes from `Arc::into_raw` and every vtable entry
    // keeps the reference count balanced.
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(header).cast(), &VTABLE)) }
}

/// Clones the raw waker.
///
/// This increments the reference count of the underlying `Arc<Header>`.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::from_raw(ptr.cast::<Header>()) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned).cast(), &VTABLE)
}

/// Wakes the task and consumes the waker.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::from_raw(ptr.cast::<Header>()) };
    arc.wake();
}

/// Wakes the task without consuming the waker.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::from_raw(ptr.cast::<Header>()) };
    arc.wake();
    mem::forget(arc);
}

/// Drops the raw waker, decrementing the reference count.
fn drop_raw(ptr: *const ()) {
    unsafe { drop(Arc::from_raw(ptr.cast::<Header>())) };
}
