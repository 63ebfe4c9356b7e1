use crate::temperature::SecurityTemperature;
use rust_decimal::Decimal;

/// Result of executing a [`crate::evaluator::RuleEvaluator`] over a
/// [`crate::RuleInput`] (spec.md §4.3 step 3), before market overlays are
/// applied. `reserved` and `decrement` are always zero here - those
/// counters belong to the stored [`crate::Inventory`] record and are
/// carried forward by the engine across a recalculation, not recomputed by
/// the rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutput {
    pub gross: Decimal,
    pub net: Decimal,
    pub available: Decimal,
    pub security_temperature: Option<SecurityTemperature>,
    pub borrow_rate: Option<Decimal>,
}

impl RuleOutput {
    pub fn zero() -> Self {
        Self {
            gross: Decimal::ZERO,
            net: Decimal::ZERO,
            available: Decimal::ZERO,
            security_temperature: None,
            borrow_rate: None,
        }
    }
}
