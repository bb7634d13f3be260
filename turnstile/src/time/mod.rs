//! Time utilities.
//!
//! This module provides [`sleep`], a future that completes once a duration
//! has elapsed. Timers are kept by the runtime driving the task and fire on
//! that runtime's thread.

mod sleep;

#[doc(inline)]
pub use sleep::{Sleep, sleep};
