//! Synchronization primitives.
//!
//! This module provides [`AsyncMutex`], a first-in first-out mutual
//! exclusion primitive for tasks:
//!
//! - [`AsyncMutex::acquire`] queues a request and resolves to a
//!   [`ReleaseHandle`] once every earlier request has been released.
//! - [`AsyncMutex::dispatch`] runs a unit of work under the lock and
//!   releases it on every exit path.
//!
//! ## Design notes
//!
//! - Waiting requests are an explicit queue of wait cells, one per call to
//!   `acquire`, served strictly in call order.
//! - Tasks that cannot acquire immediately are suspended and woken when
//!   their turn comes; the thread is never blocked.
//! - A release handle is consumed by `release` and releases on drop, so
//!   neither a double release nor a forgotten release on an error path can
//!   be written.
//! - The mutex is `Send + Sync` and can be shared between tasks with `Arc`.

mod mutex;

pub use mutex::{Acquire, AsyncMutex, ReleaseHandle};
