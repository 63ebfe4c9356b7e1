use crate::envelope::Envelope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dead-lettered event: the original envelope plus why it was killed.
/// Published to `calculation-error-events` (spec.md §6) so an operator or
/// the reference-data adapter can backfill and replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter<T> {
    pub envelope: Envelope<T>,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

impl<T> DeadLetter<T> {
    pub fn new(envelope: Envelope<T>, reason: impl Into<String>) -> Self {
        Self {
            envelope,
            reason: reason.into(),
            failed_at: Utc::now(),
        }
    }
}
