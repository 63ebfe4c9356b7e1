use crate::key::PositionKey;
use crate::ladder::Ladder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Position`]'s derived fields (spec.md §3).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Pending,
    Valid,
    Error,
}

/// Authoritative position for one `(book, security, business_date)`,
/// reconstructed from trade and snapshot events. `current_net` and
/// `projected_net` are derived fields recomputed by
/// [`crate::PositionEngine`] after every mutation, never written to
/// directly by a caller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub key: PositionKey,
    pub contractual_qty: Decimal,
    pub settled_qty: Decimal,
    pub ladder: Ladder,
    pub current_net: Decimal,
    pub projected_net: Decimal,
    pub calculation_status: CalculationStatus,
}

impl Position {
    pub fn new(key: PositionKey) -> Self {
        Self {
            key,
            contractual_qty: Decimal::ZERO,
            settled_qty: Decimal::ZERO,
            ladder: Ladder::default(),
            current_net: Decimal::ZERO,
            projected_net: Decimal::ZERO,
            calculation_status: CalculationStatus::Pending,
        }
    }

    /// `current_net = settled_qty + contractual_qty` (spec.md §3).
    ///
    /// `projected_net = settled_qty + ladder.net_settlement()`: the ladder
    /// is the authoritative representation of the unsettled contractual
    /// amount (every `contractual_qty` movement is booked onto a ladder
    /// slot in the same call, per [`crate::PositionEngine::on_trade`]), so
    /// folding `current_net` into the projection as well would double-count
    /// it. Marks the position `Valid`.
    pub fn recompute(&mut self) {
        self.current_net = self.settled_qty + self.contractual_qty;
        self.projected_net = self.settled_qty + self.ladder.net_settlement();
        self.calculation_status = CalculationStatus::Valid;
    }

    pub fn mark_error(&mut self) {
        self.calculation_status = CalculationStatus::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ims_model::{BookId, BusinessDate, SecurityId};
    use rust_decimal_macros::dec;

    fn key() -> PositionKey {
        PositionKey::new(
            BookId::from("BOOK-1"),
            SecurityId::from("SEC-1"),
            BusinessDate(NaiveDate::from_ymd_opt(2026, 7, 28).unwrap()),
        )
    }

    #[test]
    fn new_position_starts_pending_and_zeroed() {
        let position = Position::new(key());
        assert_eq!(position.calculation_status, CalculationStatus::Pending);
        assert_eq!(position.current_net, Decimal::ZERO);
    }

    #[test]
    fn recompute_derives_current_and_projected_net() {
        let mut position = Position::new(key());
        position.contractual_qty = dec!(100);
        position.settled_qty = dec!(50);
        position.ladder.add_receipt(0, dec!(20));
        position.ladder.add_deliver(1, dec!(5));
        position.recompute();

        assert_eq!(position.current_net, dec!(150));
        assert_eq!(position.projected_net, dec!(65));
        assert_eq!(position.calculation_status, CalculationStatus::Valid);
    }

    #[test]
    fn mark_error_overrides_status_without_touching_quantities() {
        let mut position = Position::new(key());
        position.recompute();
        position.mark_error();
        assert_eq!(position.calculation_status, CalculationStatus::Error);
    }
}
