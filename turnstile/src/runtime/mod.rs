//! Core runtime components.
//!
//! This module contains the single-threaded cooperative runtime that
//! drives the crate's futures:
//! - executing spawned tasks in wake order,
//! - firing timers,
//! - parking the driving thread when nothing is runnable,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with [`RuntimeBuilder`](crate::RuntimeBuilder),
//! [`task::spawn`] and the `#[turnstile::main]` / `#[turnstile::test]`
//! attributes rather than with this module directly.

pub(crate) mod scheduler;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod timer;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
