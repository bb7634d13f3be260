//! # Turnstile
//!
//! **Turnstile** provides [`AsyncMutex`](sync::AsyncMutex), a first-in
//! first-out mutual exclusion primitive for cooperatively scheduled tasks,
//! together with the small single-threaded runtime that drives it.
//!
//! The mutex guarantees that:
//!
//! - at most one task's critical section runs at a time,
//! - requests are granted strictly in the order they were issued,
//! - the lock is always released, even when the critical section returns
//!   an error or panics.
//!
//! The runtime is deliberately minimal: one thread, a FIFO run queue, a
//! timer heap and cooperative yielding. There is no I/O reactor and no
//! work stealing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turnstile::sync::AsyncMutex;
//! use turnstile::task;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[turnstile::main]
//! async fn main() {
//!     let mutex = Arc::new(AsyncMutex::new());
//!     let counter = Arc::new(AtomicUsize::new(0));
//!
//!     let handles: Vec<_> = (0..3)
//!         .map(|_| {
//!             let (mutex, counter) = (mutex.clone(), counter.clone());
//!             task::spawn(async move {
//!                 mutex
//!                     .dispatch(|| async move {
//!                         counter.fetch_add(1, Ordering::SeqCst);
//!                     })
//!                     .await
//!             })
//!         })
//!         .collect();
//!
//!     for handle in handles {
//!         handle.await.unwrap();
//!     }
//!
//!     assert_eq!(counter.load(Ordering::SeqCst), 3);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: the FIFO async mutex
//! - [`task`]: spawning tasks and awaiting their results
//! - [`time`]: timers
//! - [`error`]: runtime error types
//!
//! ## Logging
//!
//! Turnstile emits records through the [`log`] facade: per-ticket events at
//! `trace` level, runtime lifecycle at `debug`, and task panics at `warn`.
//! Installing a logger is left to the application.

mod runtime;
mod utils;

pub mod error;
pub mod sync;
pub mod time;

pub use error::{BuildError, JoinError};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use turnstile_macros::{join, main, test};
