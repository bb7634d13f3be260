use super::Runtime;
use crate::error::BuildError;

/// Default number of tasks polled between two checks of the timers and
/// the root future.
const DEFAULT_EVENT_INTERVAL: usize = 61;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime. Every runtime is single-threaded: tasks are
/// polled on the thread that calls [`Runtime::block_on`].
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .event_interval(16)
///     .name("worker")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    /// Tasks polled before the scheduler looks at timers again.
    event_interval: usize,

    /// Label attached to the runtime's log records.
    name: String,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    pub fn new() -> Self {
        Self {
            event_interval: DEFAULT_EVENT_INTERVAL,
            name: String::from("turnstile"),
        }
    }

    /// Sets how many queued tasks are polled before the runtime fires due
    /// timers and re-polls the root future.
    ///
    /// Lower values make timers and the root future more responsive at the
    /// cost of more bookkeeping per task. Zero is rejected by
    /// [`build`](Self::build).
    pub fn event_interval(mut self, n: usize) -> Self {
        self.event_interval = n;
        self
    }

    /// Sets the label used in the runtime's log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Result<Runtime, BuildError> {
        if self.event_interval == 0 {
            return Err(BuildError::ZeroEventInterval);
        }

        if self.name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }

        Ok(Runtime::new(self.event_interval, self.name))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
