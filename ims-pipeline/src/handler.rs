use ims_core::CoreError;
use std::time::Duration;

/// What a handler tells the worker to do with the event it just processed
/// (spec.md §4.1's handler contract).
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    /// The event applied successfully (or the engine already persisted an
    /// `ERROR` calculation status for it - either way the pipeline's job
    /// is done).
    Ok,
    /// Transient failure; re-enqueue after `after`.
    Retry(Duration),
    /// Permanent failure; route to the dead-letter topic with `reason`.
    Dead(String),
}

impl HandlerOutcome {
    /// Classify a [`CoreError`] per spec.md §7: retryable kinds become
    /// `Retry` at the given backoff delay, everything else dead-letters
    /// immediately with no retry.
    pub fn from_error(error: &CoreError, retry_after: Duration) -> Self {
        if error.kind.is_retryable() {
            Self::Retry(retry_after)
        } else {
            Self::Dead(error.message.clone())
        }
    }
}
