/// Task is idle and not scheduled.
///
/// The task exists but is waiting for a waker to fire.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
///
/// The task sits in the scheduler run queue, exactly once.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled.
pub(crate) const RUNNING: usize = 2;

/// Task has completed execution, successfully or by panicking.
///
/// The future has been dropped and will not be polled again.
pub(crate) const COMPLETED: usize = 3;

/// Task has been woken while running.
///
/// It goes back to the tail of the run queue once the current poll
/// returns `Poll::Pending`.
pub(crate) const NOTIFIED: usize = 4;

/// The runtime was dropped before the task completed.
pub(crate) const SHUTDOWN: usize = 5;
