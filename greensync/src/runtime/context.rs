use super::executor::Executor;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Thread-local handle to the executor driving this thread.
    ///
    /// This is set when entering the runtime context and allows
    /// `spawn`, the scheduler and the sync primitives to reach the
    /// executor without explicit parameter passing.
    static CURRENT_EXECUTOR: RefCell<Option<Rc<Executor>>> = const { RefCell::new(None) };
}

/// Restores the previously installed executor, even on unwind.
struct Restore(Option<Rc<Executor>>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT_EXECUTOR.with(|current| *current.borrow_mut() = previous);
    }
}

/// Enters the runtime execution context for the current thread.
///
/// `executor` is installed for the duration of the closure `f`. After the
/// closure completes, or unwinds, the previous context is restored.
pub(crate) fn enter_context<R>(executor: Rc<Executor>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_EXECUTOR.with(|current| current.replace(Some(executor)));
    let _restore = Restore(previous);

    f()
}

/// Returns the executor driving this thread, if any.
pub(crate) fn current_executor() -> Option<Rc<Executor>> {
    CURRENT_EXECUTOR.with(|current| current.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_restored_after_exit() {
        assert!(current_executor().is_none());

        let outer = Rc::new(Executor::new(0));
        let inner = Rc::new(Executor::new(0));

        enter_context(outer.clone(), || {
            enter_context(inner.clone(), || {
                let active = current_executor().unwrap();
                assert!(Rc::ptr_eq(&active, &inner));
            });

            let active = current_executor().unwrap();
            assert!(Rc::ptr_eq(&active, &outer));
        });

        assert!(current_executor().is_none());
    }
}
