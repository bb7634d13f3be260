use super::state::{IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::task::Task;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::task::Wake;

/// Waking a task reschedules it on the runtime that spawned it.
///
/// - `IDLE` moves to `QUEUED` and the task is pushed to the tail of the
///   run queue.
/// - `RUNNING` moves to `NOTIFIED`; the task re-queues itself once the
///   current poll returns.
/// - Every other state ignores the wake-up, so a task never sits in the
///   run queue twice.
impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.scheduler.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }
}
