use crate::error::JoinError;
use crate::runtime::task::Task;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A handle to a spawned task.
///
/// A `JoinHandle` allows awaiting the result of a task spawned onto the
/// runtime. It resolves to `Ok(output)` once the task completes, or to a
/// [`JoinError`] if the task panicked or the runtime was dropped first.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result.
pub struct JoinHandle<T> {
    /// Shared reference to the underlying task.
    pub(crate) task: Arc<Task<T>>,

    /// Set once the output has been handed out.
    pub(crate) taken: bool,
}

impl<T> JoinHandle<T> {
    /// Returns `true` if the task has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.taken || self.task.join.lock().output.is_some()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    /// Polls the join handle.
    ///
    /// The output check and the waker registration happen under the same
    /// lock the task takes to publish its output, so no wake-up is missed.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.taken, "JoinHandle polled after completion");

        let mut join = this.task.join.lock();

        if let Some(output) = join.output.take() {
            drop(join);
            this.taken = true;
            return Poll::Ready(output);
        }

        join.waker = Some(cx.waker().clone());

        Poll::Pending
    }
}
