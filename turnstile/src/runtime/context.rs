use crate::runtime::scheduler::SchedulerHandle;

use std::cell::RefCell;

thread_local! {
    /// Scheduler of the runtime currently driving this thread.
    ///
    /// This is set for the duration of [`Runtime::block_on`] and allows
    /// runtime components (spawning, timers) to reach the scheduler
    /// without explicit parameter passing.
    ///
    /// [`Runtime::block_on`]: crate::Runtime::block_on
    static CURRENT: RefCell<Option<SchedulerHandle>> = const { RefCell::new(None) };
}

/// Restores the absence of a runtime context when dropped.
///
/// Dropping happens on unwinding too, so a panicking root future does not
/// leave a stale scheduler installed on the thread.
pub(crate) struct EnterGuard {
    _private: (),
}

impl Drop for EnterGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.borrow_mut().take());
    }
}

/// Enters the runtime execution context for the current thread.
///
/// # Panics
///
/// Panics if the thread is already driving a runtime: `block_on` cannot be
/// nested.
pub(crate) fn enter(scheduler: SchedulerHandle) -> EnterGuard {
    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        assert!(
            current.is_none(),
            "cannot start a runtime from within a runtime"
        );
        *current = Some(scheduler);
    });

    EnterGuard { _private: () }
}

/// Runs `f` with the scheduler of the current runtime.
///
/// Returns `None` when called outside of a runtime.
pub(crate) fn with_current<R>(f: impl FnOnce(&SchedulerHandle) -> R) -> Option<R> {
    CURRENT.with(|current| {
        let scheduler = current.borrow().clone()?;
        Some(f(&scheduler))
    })
}
