use serde::{Deserialize, Serialize};

/// Borrow-difficulty classification carried opaquely on an [`crate::Inventory`]
/// record, set verbatim from the evaluating rule's output (spec.md §4.3:
/// "opaque to the engine and propagated verbatim").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityTemperature {
    /// Hard to borrow.
    Htb,
    /// General collateral.
    Gc,
}
