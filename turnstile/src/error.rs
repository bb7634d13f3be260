//! Error types surfaced by the runtime.
//!
//! The mutex itself has no failure modes: whatever a unit of work passed to
//! [`AsyncMutex::dispatch`](crate::sync::AsyncMutex::dispatch) returns is
//! handed back untouched. The errors below only concern building a runtime
//! and observing spawned tasks.

use std::any::Any;

use thiserror::Error;

/// Errors returned by [`RuntimeBuilder::build`](crate::RuntimeBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The scheduler must poll at least one task between two checks of the
    /// timers and the root future.
    #[error("event_interval must be greater than zero")]
    ZeroEventInterval,

    /// The runtime name is used to label log records and cannot be blank.
    #[error("runtime name must not be empty")]
    EmptyName,
}

/// Error produced when awaiting a [`JoinHandle`](crate::task::JoinHandle)
/// whose task did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The task panicked while being polled.
    #[error("task panicked: {message}")]
    Panicked {
        /// The panic payload, rendered as text when it was a string.
        message: String,
    },

    /// The runtime was dropped while the task was still pending.
    #[error("runtime shut down before the task completed")]
    Shutdown,
}

impl JoinError {
    /// Returns `true` if the task ended by panicking.
    pub fn is_panic(&self) -> bool {
        matches!(self, JoinError::Panicked { .. })
    }

    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };

        JoinError::Panicked { message }
    }
}
