use crate::runtime::task::{JoinHandle, Runnable, Task};
use crate::runtime::timer::{TimerEntry, TimerShared};
use crate::utils::Slab;

use log::{debug, trace};
use parking_lot::{Condvar, Mutex};

use std::collections::{BinaryHeap, VecDeque};
use std::future::Future;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Shared handle to a scheduler.
pub(crate) type SchedulerHandle = Arc<Scheduler>;

/// Single-threaded cooperative scheduler.
///
/// The scheduler owns everything a runtime needs to make progress:
/// - a FIFO run queue of woken tasks,
/// - a min-heap of pending timers,
/// - the registry of every live task,
/// - a parking slot used by the driving thread when nothing is runnable.
///
/// Only the thread inside [`Runtime::block_on`](crate::Runtime::block_on)
/// polls tasks. Wakers may fire from any thread; they only push to the
/// run queue and unpark the driver.
pub(crate) struct Scheduler {
    /// Tasks ready to be polled, in wake order.
    run_queue: Mutex<VecDeque<Arc<dyn Runnable>>>,

    /// Pending timers ordered by deadline.
    timers: Mutex<BinaryHeap<TimerEntry>>,

    /// Sequence counter for timer registration order.
    timer_seq: AtomicU64,

    /// Every task that has not completed yet.
    owned: Mutex<Slab<Arc<dyn Runnable>>>,

    /// Set by [`unpark`](Self::unpark); consumed by [`park`](Self::park).
    notified: Mutex<bool>,

    /// Condition variable the driving thread parks on.
    condvar: Condvar,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub(crate) fn new() -> Self {
        Self {
            run_queue: Mutex::new(VecDeque::new()),
            timers: Mutex::new(BinaryHeap::new()),
            timer_seq: AtomicU64::new(0),
            owned: Mutex::new(Slab::with_capacity(64)),
            notified: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Creates a task for `future`, registers it and queues it.
    pub(crate) fn spawn<F, T>(self: &Arc<Self>, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let task = {
            let mut owned = self.owned.lock();
            let key = owned.vacant_key();
            let task = Arc::new(Task::new(future, key, self.clone()));
            owned.insert(task.clone());
            task
        };

        self.push(task.clone());

        JoinHandle { task, taken: false }
    }

    /// Removes a completed task from the registry.
    pub(crate) fn deregister(&self, key: usize) {
        let removed = self.owned.lock().remove(key);
        drop(removed);
    }

    /// Returns the number of tasks that have not completed yet.
    pub(crate) fn live_tasks(&self) -> usize {
        self.owned.lock().len()
    }

    /// Appends a task to the tail of the run queue and unparks the driver.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.run_queue.lock().push_back(task);
        self.unpark();
    }

    /// Pops the task at the head of the run queue.
    fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.run_queue.lock().pop_front()
    }

    /// Polls at most `budget` queued tasks and returns how many ran.
    pub(crate) fn run_batch(&self, budget: usize) -> usize {
        let mut ran = 0;

        while ran < budget {
            let Some(task) = self.pop() else {
                break;
            };

            task.run();
            ran += 1;
        }

        ran
    }

    /// Registers a timer that fires `shared` at `deadline`.
    pub(crate) fn add_timer(&self, deadline: Instant, shared: Arc<TimerShared>) {
        let seq = self.timer_seq.fetch_add(1, Ordering::Relaxed);

        self.timers.lock().push(TimerEntry {
            deadline,
            seq,
            shared,
        });
        self.unpark();
    }

    /// Wakes every timer whose deadline is at or before `now`.
    ///
    /// Returns the number of wakers fired. Wakers are invoked after the
    /// timer heap lock is released.
    pub(crate) fn fire_timers(&self, now: Instant) -> usize {
        let mut due = Vec::new();

        {
            let mut timers = self.timers.lock();

            while let Some(entry) = timers.peek() {
                if entry.deadline > now {
                    break;
                }

                if let Some(entry) = timers.pop() {
                    due.push(entry);
                }
            }
        }

        let mut fired = 0;
        for entry in due {
            if let Some(waker) = entry.shared.fire() {
                waker.wake();
                fired += 1;
            }
        }

        if fired > 0 {
            trace!("fired {fired} timer(s)");
        }

        fired
    }

    /// Blocks the driving thread until it is unparked or the next timer
    /// is due.
    ///
    /// Returns immediately if an unpark happened since the last park.
    pub(crate) fn park(&self) {
        let timeout = self
            .timers
            .lock()
            .peek()
            .map(|entry| entry.deadline.saturating_duration_since(Instant::now()));

        let mut notified = self.notified.lock();

        if !*notified {
            match timeout {
                Some(timeout) if timeout.is_zero() => {}
                Some(timeout) => {
                    self.condvar.wait_for(&mut notified, timeout);
                }
                None => self.condvar.wait(&mut notified),
            }
        }

        *notified = false;
    }

    /// Wakes the driving thread if it is parked.
    pub(crate) fn unpark(&self) {
        *self.notified.lock() = true;
        self.condvar.notify_one();
    }

    /// Drops every pending task and timer.
    ///
    /// Dropping a task's future may release locks and wake other tasks;
    /// those wake-ups land in the run queue, which is cleared last.
    pub(crate) fn shutdown(&self) {
        let tasks = self.owned.lock().drain();

        if !tasks.is_empty() {
            debug!("shutting down {} pending task(s)", tasks.len());
        }

        for task in &tasks {
            task.shutdown();
        }
        drop(tasks);

        loop {
            let queued = mem::take(&mut *self.run_queue.lock());
            if queued.is_empty() {
                break;
            }
            drop(queued);
        }

        let timers = mem::take(&mut *self.timers.lock());
        drop(timers);
    }
}
