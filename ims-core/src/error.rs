use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker distinguishing errors a caller may retry from ones it must not.
///
/// The Event Pipeline inspects this via [`CoreError::is_unrecoverable`]
/// rather than matching on individual variants, so new error kinds don't
/// require touching pipeline dispatch logic.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

impl<T> Unrecoverable for tokio::sync::mpsc::error::SendError<T> {
    fn is_unrecoverable(&self) -> bool {
        true
    }
}

/// Broad error kind, independent of which engine raised it. Mirrors the
/// taxonomy in the system's error-handling design: each kind maps to a
/// stable HTTP-style status for the query façade and to a retry/dead-letter
/// decision for the event pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum ErrorKind {
    /// Malformed envelope, unknown order type, settlement day outside [0,4].
    Validation,
    /// Unknown security, counterparty or aggregation unit.
    NotFound,
    /// `reserve` would drive `available` negative.
    InsufficientAvailability,
    /// `record_order` would drive `*_used` past `*_limit`.
    LimitExceeded,
    /// Compare-and-swap version mismatch on a cache write.
    Conflict,
    /// Lease or deadline expired before the operation completed.
    Timeout,
    /// No lease could be obtained within `lease_timeout_ms`.
    LeaseUnavailable,
    /// Cache quorum lost or broker unreachable; circuit breaker may open.
    DownstreamUnavailable,
}

impl ErrorKind {
    /// Stable HTTP-style status code for the query façade (spec §7).
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InsufficientAvailability | ErrorKind::LimitExceeded => 422,
            ErrorKind::Timeout | ErrorKind::LeaseUnavailable | ErrorKind::DownstreamUnavailable => {
                504
            }
        }
    }

    /// Whether the Event Pipeline should retry (`true`) or dead-letter
    /// (`false`) a handler failure carrying this kind.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::LeaseUnavailable | ErrorKind::DownstreamUnavailable
        )
    }
}

/// Top-level error type threaded through engine operations and the query
/// façade. Carries a `correlation_id` so a dead-lettered event and its
/// `calculation-error-event` can be joined by operators.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub correlation_id: Option<String>,
}

impl CoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            correlation_id: None,
        }
    }

    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn insufficient_availability(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientAvailability, message)
    }

    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LimitExceeded, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn lease_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LeaseUnavailable, message)
    }

    pub fn downstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DownstreamUnavailable, message)
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }
}

impl Unrecoverable for CoreError {
    fn is_unrecoverable(&self) -> bool {
        !self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_spec() {
        assert_eq!(ErrorKind::Validation.status(), 400);
        assert_eq!(ErrorKind::NotFound.status(), 404);
        assert_eq!(ErrorKind::Conflict.status(), 409);
        assert_eq!(ErrorKind::LimitExceeded.status(), 422);
        assert_eq!(ErrorKind::Timeout.status(), 504);
    }

    #[test]
    fn only_transient_kinds_are_retryable() {
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::LeaseUnavailable.is_retryable());
        assert!(ErrorKind::DownstreamUnavailable.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::LimitExceeded.is_retryable());
    }

    #[test]
    fn correlation_id_round_trips() {
        let err = CoreError::not_found("security XYZ").with_correlation("corr-1");
        assert_eq!(err.correlation_id.as_deref(), Some("corr-1"));
    }
}
