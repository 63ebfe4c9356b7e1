use ims_model::{BusinessDate, OwnerId, SecurityId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One book's contribution to a `(owner, security)` limit recalculation
/// (spec.md §4.4). Assembled externally by joining Position Engine output
/// (for `projected_net`) with Inventory Engine output (for the
/// `SHORT_SELL` availability figure), the way [`crate::engine`]'s callers
/// are expected to join across engine boundaries - the Limit Engine itself
/// never reads a position or an inventory record directly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionContribution {
    pub owner_id: OwnerId,
    pub security_id: SecurityId,
    pub business_date: BusinessDate,
    /// `projected_net` for this book/security, per spec.md's Open
    /// Questions: "long" is defined here as `projected_net > 0`.
    pub projected_net: Decimal,
    /// The security's `SHORT_SELL` inventory availability for this owner
    /// scope, as computed by the Inventory Engine.
    pub short_sell_availability: Decimal,
}
