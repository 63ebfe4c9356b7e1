//! Position Engine: event-sourced reconstruction of one position per
//! `(book, security, business_date)`, with a five-day settlement ladder
//! driving `current_net`/`projected_net` (spec.md §4.2).

pub mod engine;
pub mod key;
pub mod ladder;
pub mod position;
pub mod trade;

pub use engine::PositionEngine;
pub use key::PositionKey;
pub use ladder::{Ladder, SettlementDay, LADDER_DAYS};
pub use position::{CalculationStatus, Position};
pub use trade::{Side, TradeEvent};
