use crate::rule_input::RuleInput;
use crate::rule_output::RuleOutput;
use ims_model::ContractDirection;
use rust_decimal::Decimal;

/// A rule's executable formula, kept a small independently testable unit
/// rather than a monolithic `match` over calculation type - the shape
/// mirrors `jackbot-risk`'s per-concern trackers (`ExposureTracker`,
/// `PositionTracker`), each a single `check`-like entry point over a typed
/// input.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, input: &RuleInput) -> RuleOutput;
}

/// The default availability formula applied to every calculation type.
/// `gross` is the security's projected long position; `net` subtracts
/// quantity already committed out under an active, non-expired `Loan`
/// contract (shares the firm has lent or pledged away); `available` starts
/// equal to `net` before overlays and before `reserved`/`decrement` are
/// reapplied by the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseAvailabilityRule;

impl RuleEvaluator for BaseAvailabilityRule {
    fn evaluate(&self, input: &RuleInput) -> RuleOutput {
        let gross = input.projected_position_qty.max(Decimal::ZERO);
        let committed: Decimal = input
            .contracts
            .iter()
            .filter(|c| c.direction == ContractDirection::Loan && !c.is_expired(input.business_date))
            .map(|c| c.quantity)
            .sum();
        let net = (gross - committed).max(Decimal::ZERO);
        RuleOutput {
            gross,
            net,
            available: net,
            security_temperature: None,
            borrow_rate: None,
        }
    }
}
