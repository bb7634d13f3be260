//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the runtime.
//! In particular, it exposes a [`Slab`] used to register live tasks under
//! small reusable keys.

mod slab;

pub(crate) use slab::Slab;
