use crate::key::InventoryKey;
use crate::temperature::SecurityTemperature;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Authoritative availability record for one inventory key, produced by the
/// Inventory Engine and read by the Limit Engine and query façade
/// (spec.md §3/§4.3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Inventory {
    pub key: InventoryKey,
    pub gross: Decimal,
    pub net: Decimal,
    pub available: Decimal,
    pub reserved: Decimal,
    pub decrement: Decimal,
    pub security_temperature: Option<SecurityTemperature>,
    pub borrow_rate: Option<Decimal>,
}

impl Inventory {
    pub fn new(key: InventoryKey) -> Self {
        Self {
            key,
            gross: Decimal::ZERO,
            net: Decimal::ZERO,
            available: Decimal::ZERO,
            reserved: Decimal::ZERO,
            decrement: Decimal::ZERO,
            security_temperature: None,
            borrow_rate: None,
        }
    }

    /// `remaining = available − decrement` (spec.md §3 invariant
    /// `remaining ≥ 0`, enforced by `decrement`/`reserve` never letting
    /// either subtrahend exceed its minuend).
    pub fn remaining(&self) -> Decimal {
        self.available - self.decrement
    }
}
