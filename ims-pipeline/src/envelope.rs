use chrono::{DateTime, Utc};
use derive_more::Display;
use ims_model::{BookId, BusinessDate, OwnerId, SecurityId};
use serde::{Deserialize, Serialize};

/// The partition-assignment key for an event. Every event the pipeline
/// carries derives one of these three shapes (spec.md §4.1).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
pub struct RoutingKey(pub String);

impl RoutingKey {
    /// `book_id|security_id`, used by position and trade events.
    pub fn position(book: &BookId, security: &SecurityId) -> Self {
        Self(format!("{book}|{security}"))
    }

    /// `security_id`, used by market and reference-data events.
    pub fn reference(security: &SecurityId) -> Self {
        Self(security.to_string())
    }

    /// `owner_id|security_id`, used by limit-update events.
    pub fn limit(owner: &OwnerId, security: &SecurityId) -> Self {
        Self(format!("{owner}|{security}"))
    }
}

/// The typed wrapper every event travels through the pipeline in. Carries
/// identity, provenance, timing and the partition key alongside the
/// domain payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub event_id: String,
    pub event_type: String,
    pub source: String,
    pub emit_time: DateTime<Utc>,
    pub business_date: BusinessDate,
    pub correlation_id: String,
    pub routing_key: RoutingKey,
    /// Deadline propagated from the caller or an upstream envelope; the
    /// short-sell path's 120 ms internal budget is enforced by comparing
    /// against this (spec.md §5 "Cancellation & timeouts").
    pub deadline: Option<DateTime<Utc>>,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        matches!(self.deadline, Some(deadline) if now > deadline)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            event_id: self.event_id,
            event_type: self.event_type,
            source: self.source,
            emit_time: self.emit_time,
            business_date: self.business_date,
            correlation_id: self.correlation_id,
            routing_key: self.routing_key,
            deadline: self.deadline,
            payload: f(self.payload),
        }
    }
}
