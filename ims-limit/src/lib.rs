//! Limit Engine: client and aggregation-unit sell limits, maintained from
//! Position/Inventory Engine output and validated/decremented at trading
//! latency for the short-sell workflow (spec.md §4.4).

pub mod contribution;
pub mod engine;
pub mod idempotence;
pub mod key;
pub mod limit;
pub mod side;

pub use contribution::PositionContribution;
pub use engine::{LimitEngine, SellLimitPair};
pub use key::LimitKey;
pub use limit::{LimitStatus, SellLimit};
pub use side::OrderSide;
