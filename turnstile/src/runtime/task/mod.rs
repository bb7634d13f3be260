//! Asynchronous task primitives.
//!
//! This module defines the abstractions used by the runtime to represent,
//! schedule, and execute spawned tasks:
//! - task state management,
//! - waker integration,
//! - join handles for awaiting task completion,
//! - the core task and runnable abstractions.
//!
//! Most users will interact with this module through [`spawn`] and
//! [`JoinHandle`]; the lower-level components are used internally by the
//! scheduler.

pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

pub(crate) mod core;

pub(crate) use self::core::{Runnable, Task};

pub use self::core::spawn;
pub use handle::JoinHandle;
