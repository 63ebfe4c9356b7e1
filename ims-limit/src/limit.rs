use crate::key::LimitKey;
use crate::side::OrderSide;
use ims_core::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`SellLimit`] record.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    Active,
    Suspended,
}

/// A `ClientLimit` or `AggregationUnitLimit` (spec.md §3) - the two are
/// separate logical tables keyed by which [`ims_model::OwnerId`] variant
/// is in [`LimitKey::owner_id`], sharing this one record shape.
///
/// Invariants (enforced by [`SellLimit::increment_used`], never by direct
/// field mutation): `long_sell_used <= long_sell_limit` and
/// `short_sell_used <= short_sell_limit`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SellLimit {
    pub key: LimitKey,
    pub long_sell_limit: Decimal,
    pub short_sell_limit: Decimal,
    pub long_sell_used: Decimal,
    pub short_sell_used: Decimal,
    pub status: LimitStatus,
}

impl SellLimit {
    pub fn new(key: LimitKey) -> Self {
        Self {
            key,
            long_sell_limit: Decimal::ZERO,
            short_sell_limit: Decimal::ZERO,
            long_sell_used: Decimal::ZERO,
            short_sell_used: Decimal::ZERO,
            status: LimitStatus::Active,
        }
    }

    fn limit_for(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::LongSell => self.long_sell_limit,
            OrderSide::ShortSell => self.short_sell_limit,
        }
    }

    fn used_for(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::LongSell => self.long_sell_used,
            OrderSide::ShortSell => self.short_sell_used,
        }
    }

    /// Remaining capacity for `side`: `limit - used`, never negative.
    pub fn remaining(&self, side: OrderSide) -> Decimal {
        (self.limit_for(side) - self.used_for(side)).max(Decimal::ZERO)
    }

    /// `validate_order`'s core predicate for this one limit record: does
    /// it, alone, have at least `qty` of capacity on `side`.
    pub fn has_capacity(&self, side: OrderSide, qty: Decimal) -> bool {
        self.status == LimitStatus::Active && self.remaining(side) >= qty
    }

    /// Atomically advances `*_used` by `qty`, failing with
    /// [`ims_core::ErrorKind::LimitExceeded`] rather than ever letting
    /// `used` exceed `limit` (spec.md §3 invariant, §8 property 3).
    pub fn increment_used(&mut self, side: OrderSide, qty: Decimal) -> Result<(), CoreError> {
        if !self.has_capacity(side, qty) {
            return Err(CoreError::limit_exceeded(format!(
                "{side} order of {qty} exceeds remaining capacity {} for {}",
                self.remaining(side),
                self.key.cache_key()
            )));
        }
        match side {
            OrderSide::LongSell => self.long_sell_used += qty,
            OrderSide::ShortSell => self.short_sell_used += qty,
        }
        Ok(())
    }
}
