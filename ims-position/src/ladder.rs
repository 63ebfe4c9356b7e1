use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of settlement-ladder slots the engine maintains (`sd0..sd4`).
pub const LADDER_DAYS: usize = 5;

/// One day's worth of expected settlement activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettlementDay {
    pub deliver: Decimal,
    pub receipt: Decimal,
}

impl SettlementDay {
    pub fn net(&self) -> Decimal {
        self.receipt - self.deliver
    }
}

/// The five-day settlement ladder (`sd0..sd4`) attached to a [`crate::Position`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ladder {
    days: [SettlementDay; LADDER_DAYS],
}

impl Default for Ladder {
    fn default() -> Self {
        Self {
            days: [SettlementDay::default(); LADDER_DAYS],
        }
    }
}

impl Ladder {
    /// `days[offset].receipt += qty`; `offset` must be in `[0, 4]` (the
    /// settlement-window invariant is enforced by the caller before this
    /// is reached).
    pub fn add_receipt(&mut self, offset: usize, qty: Decimal) {
        self.days[offset].receipt += qty;
    }

    pub fn add_deliver(&mut self, offset: usize, qty: Decimal) {
        self.days[offset].deliver += qty;
    }

    pub fn day(&self, offset: usize) -> SettlementDay {
        self.days[offset]
    }

    /// `Σ (sdN.receipt − sdN.deliver)` for `N = 0..4` (spec.md §3).
    pub fn net_settlement(&self) -> Decimal {
        self.days.iter().map(SettlementDay::net).sum()
    }

    pub fn replace(&mut self, days: [SettlementDay; LADDER_DAYS]) {
        self.days = days;
    }
}
