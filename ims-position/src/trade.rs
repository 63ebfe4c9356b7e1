use crate::key::PositionKey;
use derive_more::Display;
use ims_model::BusinessDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of a trade the booked quantity is on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

/// A single trade event the Position Engine applies via
/// [`crate::PositionEngine::on_trade`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradeEvent {
    pub key: PositionKey,
    pub side: Side,
    pub qty: Decimal,
    pub settlement_date: BusinessDate,
}

impl TradeEvent {
    /// `Δ = settlement_date − business_date`. `None` if the settlement
    /// date falls outside `[0, 4]` business days from the trade's
    /// business date (spec.md §3's settlement-window invariant).
    pub fn settlement_offset(&self) -> Option<usize> {
        let delta = self.key.business_date.offset_to(self.settlement_date)?;
        usize::try_from(delta).ok().filter(|&d| d <= 4)
    }
}
