use crate::runtime::context;
use crate::runtime::timer::TimerShared;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// The deadline is computed when `sleep` is called, not when the future is
/// first polled.
///
/// # Panics
///
/// The returned future panics if it is polled, before its deadline, outside
/// of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep {
        deadline: Instant::now() + duration,
        timer: None,
    }
}

/// A future that completes once a specific deadline is reached.
///
/// `Sleep` registers a timer with the current runtime on its first pending
/// poll. Dropping it before the deadline cancels the timer, so an abandoned
/// sleep never wakes its task.
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Timer state shared with the scheduler, once registered.
    timer: Option<Arc<TimerShared>>,
}

impl Sleep {
    /// Returns the instant at which the sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if let Some(timer) = &this.timer {
            timer.set_waker(cx.waker());
            return Poll::Pending;
        }

        let timer = Arc::new(TimerShared::new(cx.waker()));
        let deadline = this.deadline;

        context::with_current(|scheduler| scheduler.add_timer(deadline, timer.clone()))
            .expect("Sleep polled outside of runtime");

        this.timer = Some(timer);

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
    }
}
