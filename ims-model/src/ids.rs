use chrono::NaiveDate;
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identifier for a trading book, as assigned by the book-of-record system.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor, Display,
)]
pub struct BookId(pub SmolStr);

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Stable internal identifier for a [`crate::Security`]. Unique and stable
/// across external identifier sources (spec: "internal_id is stable
/// across sources").
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor, Display,
)]
pub struct SecurityId(pub SmolStr);

impl From<&str> for SecurityId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Identifier for a counterparty (client).
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor, Display,
)]
pub struct CounterpartyId(pub SmolStr);

impl From<&str> for CounterpartyId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Identifier for an aggregation unit.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor, Display,
)]
pub struct AggregationUnitId(pub SmolStr);

impl From<&str> for AggregationUnitId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Either a [`CounterpartyId`] or an [`AggregationUnitId`] - the owner of a
/// sell limit (spec §3: `ClientLimit` / `AggregationUnitLimit` natural key
/// is `(owner_id, security_id, business_date)`).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
pub enum OwnerId {
    Client(CounterpartyId),
    AggregationUnit(AggregationUnitId),
}

/// Trading business date, distinct from wall-clock time so the same date
/// can be replayed deterministically in tests (spec Scenario D's "clock
/// injection").
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct BusinessDate(pub NaiveDate);

impl BusinessDate {
    pub fn plus_days(self, days: i64) -> Self {
        Self(self.0 + chrono::Duration::days(days))
    }

    /// Settlement offset in days from this business date to `settlement`,
    /// or `None` if `settlement` precedes this date.
    pub fn offset_to(self, settlement: BusinessDate) -> Option<i64> {
        let delta = (settlement.0 - self.0).num_days();
        if delta < 0 { None } else { Some(delta) }
    }
}

impl From<NaiveDate> for BusinessDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn offset_to_computes_forward_days() {
        let d0 = BusinessDate(NaiveDate::from_ymd_opt(2026, 7, 28).unwrap());
        let d2 = d0.plus_days(2);
        assert_eq!(d0.offset_to(d2), Some(2));
    }

    #[test]
    fn offset_to_rejects_past_dates() {
        let d0 = BusinessDate(NaiveDate::from_ymd_opt(2026, 7, 28).unwrap());
        let yesterday = d0.plus_days(-1);
        assert_eq!(d0.offset_to(yesterday), None);
    }
}
