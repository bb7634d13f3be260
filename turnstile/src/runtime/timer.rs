use parking_lot::Mutex;

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::task::Waker;
use std::time::Instant;

/// State shared between a [`Sleep`](crate::time::Sleep) future and the
/// timer entry the scheduler keeps for it.
pub(crate) struct TimerShared {
    /// Set when the sleep future is dropped before its deadline.
    cancelled: AtomicBool,

    /// Waker of the task currently awaiting the sleep.
    ///
    /// Refreshed on every pending poll so that a sleep moved between
    /// tasks still wakes the right one.
    waker: Mutex<Option<Waker>>,
}

impl TimerShared {
    pub(crate) fn new(waker: &Waker) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            waker: Mutex::new(Some(waker.clone())),
        }
    }

    pub(crate) fn set_waker(&self, waker: &Waker) {
        let mut slot = self.waker.lock();

        if !slot.as_ref().is_some_and(|current| current.will_wake(waker)) {
            *slot = Some(waker.clone());
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);
        self.waker.lock().take();
    }

    /// Takes the waker out unless the timer was cancelled.
    pub(crate) fn fire(&self) -> Option<Waker> {
        if self.cancelled.load(AtomicOrdering::Acquire) {
            return None;
        }

        self.waker.lock().take()
    }
}

/// An entry in the scheduler timer queue.
///
/// `TimerEntry` represents a scheduled wake-up at a specific deadline and
/// lives inside a binary heap ordered by deadline. Entries sharing a
/// deadline fire in registration order.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Registration sequence number, used to break deadline ties.
    pub(crate) seq: u64,

    /// State shared with the associated sleep future.
    pub(crate) shared: Arc<TimerShared>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then by registration order.
    ///
    /// The comparison is **reversed** so that a `BinaryHeap<TimerEntry>`
    /// behaves as a min-heap, where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
