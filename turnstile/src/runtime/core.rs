use super::context;
use super::scheduler::{Scheduler, SchedulerHandle};
use super::task::JoinHandle;

use log::{debug, trace};

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Wake, Waker};
use std::time::Instant;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning asynchronous tasks,
/// - driving them cooperatively on the calling thread,
/// - firing timers registered by [`sleep`](crate::time::sleep),
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime drops every task that has not completed; their
/// join handles resolve to [`JoinError::Shutdown`](crate::JoinError::Shutdown).
pub struct Runtime {
    /// Run queue, timers and task registry.
    scheduler: SchedulerHandle,

    /// Tasks polled between two checks of timers and the root future.
    event_interval: usize,

    /// Label used in log records.
    name: String,
}

impl Runtime {
    /// Creates a new runtime instance.
    pub(crate) fn new(event_interval: usize, name: String) -> Self {
        debug!("runtime `{name}` built (event_interval = {event_interval})");

        Self {
            scheduler: Arc::new(Scheduler::new()),
            event_interval,
            name,
        }
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task is queued immediately and first polled by the next call to
    /// [`block_on`](Self::block_on).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 1 + 1 });
    /// assert_eq!(runtime.block_on(handle).unwrap(), 2);
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.scheduler.spawn(future)
    }

    /// Runs a future to completion on the current thread.
    ///
    /// While the root future is pending, spawned tasks are polled in the
    /// order they were woken and due timers are fired. When nothing is
    /// runnable the thread parks until a waker fires or the next timer is
    /// due.
    ///
    /// The root future does not need to be `Send`. Tasks still pending when
    /// it completes stay queued for the next call.
    ///
    /// # Panics
    ///
    /// Panics if called from within a runtime, and resumes any panic raised
    /// by the root future itself.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let _guard = context::enter(self.scheduler.clone());
        trace!("runtime `{}` entered block_on", self.name);

        let mut future = pin!(future);

        let root = Arc::new(RootWaker {
            woken: AtomicBool::new(true),
            scheduler: self.scheduler.clone(),
        });
        let waker = Waker::from(root.clone());
        let mut cx = Context::from_waker(&waker);

        loop {
            if root.woken.swap(false, Ordering::AcqRel) {
                if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                    trace!("runtime `{}` left block_on", self.name);
                    return output;
                }
            }

            let ran = self.scheduler.run_batch(self.event_interval);
            let fired = self.scheduler.fire_timers(Instant::now());

            if ran == 0 && fired == 0 && !root.woken.load(Ordering::Acquire) {
                self.scheduler.park();
            }
        }
    }

    /// Returns the number of spawned tasks that have not completed yet.
    pub fn live_tasks(&self) -> usize {
        self.scheduler.live_tasks()
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime, dropping every pending task and timer.
    fn drop(&mut self) {
        debug!("runtime `{}` shutting down", self.name);
        self.scheduler.shutdown();
    }
}

/// Waker of the future passed to [`Runtime::block_on`].
struct RootWaker {
    /// Set when the root future should be polled again.
    woken: AtomicBool,

    /// Scheduler whose driving thread gets unparked.
    scheduler: SchedulerHandle,
}

impl Wake for RootWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.woken.store(true, Ordering::Release);
        self.scheduler.unpark();
    }
}
