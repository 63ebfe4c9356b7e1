use ims_model::{BusinessDate, OwnerId, SecurityId};
use serde::{Deserialize, Serialize};

/// Natural key for a [`crate::SellLimit`]: `(owner_id, security_id,
/// business_date)` (spec.md §3). `owner_id` distinguishes a `ClientLimit`
/// from an `AggregationUnitLimit` - the two are separate logical tables
/// sharing one record shape, kept apart by which [`OwnerId`] variant keys
/// them rather than by a second type.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct LimitKey {
    pub owner_id: OwnerId,
    pub security_id: SecurityId,
    pub business_date: BusinessDate,
}

impl LimitKey {
    pub fn new(owner_id: OwnerId, security_id: SecurityId, business_date: BusinessDate) -> Self {
        Self {
            owner_id,
            security_id,
            business_date,
        }
    }

    /// Formatted cache key: `limit:{owner}|{security}|{date}`, matching
    /// the deterministic string-tuple shape spec.md §4.5 requires of
    /// every cache key.
    pub fn cache_key(&self) -> String {
        format!("limit:{}|{}|{}", self.owner_id, self.security_id, self.business_date)
    }
}
