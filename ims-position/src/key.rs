use derive_more::Display;
use ims_model::{BookId, BusinessDate, SecurityId};
use serde::{Deserialize, Serialize};

/// Natural key for a [`crate::Position`]: `(book_id, security_id,
/// business_date)` (spec.md §3).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
#[display("{book_id}|{security_id}|{business_date}")]
pub struct PositionKey {
    pub book_id: BookId,
    pub security_id: SecurityId,
    pub business_date: BusinessDate,
}

impl PositionKey {
    pub fn new(book_id: BookId, security_id: SecurityId, business_date: BusinessDate) -> Self {
        Self {
            book_id,
            security_id,
            business_date,
        }
    }

    /// Formatted cache key, matching spec.md §4.5's `bookId:securityId:businessDate`
    /// deterministic string-tuple shape.
    pub fn cache_key(&self) -> String {
        format!("position:{self}")
    }
}
