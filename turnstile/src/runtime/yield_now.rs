use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that suspends the current task exactly once.
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    /// On the first poll the task wakes itself and returns `Poll::Pending`,
    /// which sends it to the tail of the run queue. The second poll
    /// completes.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Yields execution back to the runtime.
///
/// Every task that was already queued runs before the current task is
/// polled again. This is the cheapest way to introduce a suspension point,
/// for example between a read and a write of shared state.
///
/// # Examples
///
/// ```rust,ignore
/// let value = counter.load(Ordering::SeqCst);
/// yield_now().await;
/// counter.store(value + 1, Ordering::SeqCst);
/// ```
pub async fn yield_now() {
    YieldNow { yielded: false }.await
}
