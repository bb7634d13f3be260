use super::JoinHandle;
use super::state::{COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING, SHUTDOWN};
use crate::error::JoinError;
use crate::runtime::context;
use crate::runtime::scheduler::SchedulerHandle;

use log::{trace, warn};
use parking_lot::Mutex;

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A runnable unit of work that can be executed by the scheduler.
///
/// The `Runnable` trait abstracts the specific return type of a task,
/// allowing the scheduler to manage a heterogeneous collection of tasks
/// through `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Polls the task once. Called by the scheduler loop.
    fn run(self: Arc<Self>);

    /// Drops the task's future without completing it.
    ///
    /// Called when the runtime is dropped with the task still pending.
    fn shutdown(&self);
}

/// Result slot shared between a task and its [`JoinHandle`].
pub(crate) struct JoinSlot<T> {
    pub(crate) output: Option<Result<T, JoinError>>,
    pub(crate) waker: Option<Waker>,
}

/// A spawned asynchronous task managed by the runtime.
///
/// A `Task` owns a `Future`, its lifecycle state and the slot its
/// [`JoinHandle`] reads the output from.
pub(crate) struct Task<T> {
    /// The underlying future; `None` once the task is finished.
    future: Mutex<Option<BoxFuture<T>>>,

    /// Output and join waker.
    pub(crate) join: Mutex<JoinSlot<T>>,

    /// The current lifecycle state of the task (IDLE, RUNNING, etc.).
    pub(crate) state: AtomicUsize,

    /// Key of this task in the scheduler's registry of live tasks.
    key: usize,

    /// Scheduler the task is rescheduled on when woken.
    pub(crate) scheduler: SchedulerHandle,
}

impl<T: Send + 'static> Task<T> {
    /// Creates a new task in the `QUEUED` state.
    ///
    /// The caller is responsible for pushing it to the run queue.
    pub(crate) fn new<F>(future: F, key: usize, scheduler: SchedulerHandle) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: Mutex::new(Some(Box::pin(future))),
            join: Mutex::new(JoinSlot {
                output: None,
                waker: None,
            }),
            state: AtomicUsize::new(QUEUED),
            key,
            scheduler,
        }
    }

    /// Polls the task once.
    ///
    /// - `Poll::Pending`: back to `IDLE`, or to the tail of the run queue if
    ///   the task was woken while running.
    /// - `Poll::Ready`: stores the output and wakes the join handle.
    /// - panic: the panic is caught, the future dropped and the join handle
    ///   receives [`JoinError::Panicked`]. Other tasks keep running.
    pub(crate) fn run(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        let mut slot = self.future.lock();
        let Some(future) = slot.as_mut() else {
            return;
        };

        trace!("polling task {}", self.key);
        let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        match poll {
            Ok(Poll::Pending) => {
                drop(slot);

                if let Err(NOTIFIED) = self.state.compare_exchange(
                    RUNNING,
                    IDLE,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    self.state.store(QUEUED, Ordering::Release);
                    self.scheduler.push(self.clone());
                }
            }
            Ok(Poll::Ready(value)) => {
                let finished = slot.take();
                drop(slot);
                drop(finished);

                self.complete(Ok(value));
            }
            Err(payload) => {
                let finished = slot.take();
                drop(slot);
                drop(finished);

                let err = JoinError::panicked(payload);
                warn!("task {} panicked: {err}", self.key);
                self.complete(Err(err));
            }
        }
    }

    fn complete(&self, output: Result<T, JoinError>) {
        let waker = {
            let mut join = self.join.lock();
            join.output = Some(output);
            join.waker.take()
        };

        self.state.store(COMPLETED, Ordering::Release);
        self.scheduler.deregister(self.key);

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }

    fn shutdown(&self) {
        if self.state.swap(SHUTDOWN, Ordering::AcqRel) == COMPLETED {
            self.state.store(COMPLETED, Ordering::Release);
            return;
        }

        // Dropping the future may release locks and wake other tasks, so
        // no task lock is held while it runs.
        let abandoned = self.future.lock().take();
        drop(abandoned);

        let waker = {
            let mut join = self.join.lock();
            if join.output.is_none() {
                join.output = Some(Err(JoinError::Shutdown));
            }
            join.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Spawns a future as a task onto the current runtime.
///
/// The task is appended to the tail of the run queue, so tasks spawned
/// back to back first run in spawn order.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(async { 6 * 7 });
/// assert_eq!(handle.await.unwrap(), 42);
/// ```
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    context::with_current(|scheduler| scheduler.spawn(future))
        .expect("spawn must be called within the context of a runtime")
}
