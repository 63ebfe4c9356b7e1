use crate::calculation_type::CalculationType;
use crate::rule_input::RuleInput;
use crate::rule_output::RuleOutput;
use crate::rules::RuleRegistry;
use ims_model::{BusinessDate, Market, RuleTag};
use rust_decimal::Decimal;

/// Applies the fixed market overlays named in spec.md §4.3, in the order
/// an AU's rule-tag set is checked. An overlay only runs when the registry
/// also carries a matching `Active` `Overlay` row for the AU's market and
/// the business date - a retired overlay row turns the behaviour off
/// without touching this code, per spec.md §9's "tag-driven overlay
/// functions, not subclassing. New markets add tags + overlay entries
/// only."
pub fn apply_overlays(
    mut output: RuleOutput,
    input: &RuleInput,
    au_rule_tags: &[RuleTag],
    registry: &RuleRegistry,
    date: BusinessDate,
) -> RuleOutput {
    for &tag in au_rule_tags {
        if registry.active_overlay(tag, input.market, date).is_none() {
            continue;
        }
        output = match tag {
            RuleTag::BorrowedSharesNoRelending => borrowed_shares_no_relending(output, input),
            RuleTag::SettlementCutoffRules => settlement_cutoff_rules(output, input),
            RuleTag::QuantoSettlementT2 => quanto_settlement_t2(output, input),
        };
    }
    output
}

/// Taiwan: inventory sourced externally cannot be re-lent under a
/// `FOR_LOAN` calculation (spec.md §4.3: "if source is external and
/// `calc_type = FOR_LOAN`, force `available = 0`").
fn borrowed_shares_no_relending(mut output: RuleOutput, input: &RuleInput) -> RuleOutput {
    if input.calc_type == CalculationType::ForLoan && input.is_external_source {
        output.available = Decimal::ZERO;
    }
    output
}

/// Japan: once the market cutoff has passed, a same-day (`T+0`) deliver
/// quantity is reclassified to `T+1` and stops counting toward today's
/// SLAB (stock-loan-and-borrow) availability.
fn settlement_cutoff_rules(mut output: RuleOutput, input: &RuleInput) -> RuleOutput {
    if input.past_settlement_cutoff {
        output.available = (output.available - input.sd0_deliver_qty).max(Decimal::ZERO);
    }
    output
}

/// Japan: a quanto-tagged quantity always settles `T+2`, regardless of the
/// instrument's native settlement cycle. Until it has actually reached
/// that slot it cannot be counted as available today.
fn quanto_settlement_t2(mut output: RuleOutput, input: &RuleInput) -> RuleOutput {
    if input.quanto_qty > Decimal::ZERO && !input.quanto_on_t2_slot {
        output.available = (output.available - input.quanto_qty).max(Decimal::ZERO);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ims_model::{RuleStatus, RuleType, SecurityId};
    use rust_decimal_macros::dec;

    fn business_date() -> BusinessDate {
        BusinessDate(NaiveDate::from_ymd_opt(2026, 7, 28).unwrap())
    }

    fn base_input(market: Market, calc_type: CalculationType) -> RuleInput {
        RuleInput {
            security_id: SecurityId::from("SEC-1"),
            calc_type,
            business_date: business_date(),
            market,
            projected_position_qty: dec!(1000),
            contracts: vec![],
            counterparty_kyc: None,
            is_external_source: false,
            sd0_deliver_qty: Decimal::ZERO,
            past_settlement_cutoff: false,
            quanto_qty: Decimal::ZERO,
            quanto_on_t2_slot: true,
        }
    }

    fn registry_with_active(tag: RuleTag, market: Market) -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry
            .insert(ims_model::CalculationRule {
                rule_id: "OV-1".into(),
                version: 1,
                rule_type: RuleType::Overlay,
                tag: Some(tag),
                market,
                priority: 1,
                effective_from: business_date(),
                effective_to: None,
                status: RuleStatus::Active,
            })
            .unwrap();
        registry
    }

    /// Scenario C from spec.md §8: security `market = TW`, inventory from
    /// an external source, `calc_type = FOR_LOAN`, no contract present.
    /// Expected output: `available = 0`.
    #[test]
    fn taiwan_overlay_forces_zero_availability_for_externally_sourced_inventory() {
        let registry = registry_with_active(RuleTag::BorrowedSharesNoRelending, Market::Taiwan);
        let mut input = base_input(Market::Taiwan, CalculationType::ForLoan);
        input.is_external_source = true;

        let output = apply_overlays(
            RuleOutput { available: dec!(10_000), ..RuleOutput::zero() },
            &input,
            &[RuleTag::BorrowedSharesNoRelending],
            &registry,
            business_date(),
        );
        assert_eq!(output.available, Decimal::ZERO);
    }

    #[test]
    fn taiwan_overlay_leaves_internally_sourced_inventory_untouched() {
        let registry = registry_with_active(RuleTag::BorrowedSharesNoRelending, Market::Taiwan);
        let input = base_input(Market::Taiwan, CalculationType::ForLoan);

        let output = apply_overlays(
            RuleOutput { available: dec!(1000), ..RuleOutput::zero() },
            &input,
            &[RuleTag::BorrowedSharesNoRelending],
            &registry,
            business_date(),
        );
        assert_eq!(output.available, dec!(1000));
    }

    #[test]
    fn japan_cutoff_overlay_excludes_sd0_deliver_once_past_cutoff() {
        let registry = registry_with_active(RuleTag::SettlementCutoffRules, Market::Japan);
        let mut input = base_input(Market::Japan, CalculationType::ForLoan);
        input.sd0_deliver_qty = dec!(200);
        input.past_settlement_cutoff = true;

        let output = apply_overlays(
            RuleOutput { available: dec!(1000), ..RuleOutput::zero() },
            &input,
            &[RuleTag::SettlementCutoffRules],
            &registry,
            business_date(),
        );
        assert_eq!(output.available, dec!(800));
    }

    #[test]
    fn quanto_overlay_excludes_quantity_not_yet_on_t2_slot() {
        let registry = registry_with_active(RuleTag::QuantoSettlementT2, Market::Japan);
        let mut input = base_input(Market::Japan, CalculationType::ForLoan);
        input.quanto_qty = dec!(150);
        input.quanto_on_t2_slot = false;

        let output = apply_overlays(
            RuleOutput { available: dec!(1000), ..RuleOutput::zero() },
            &input,
            &[RuleTag::QuantoSettlementT2],
            &registry,
            business_date(),
        );
        assert_eq!(output.available, dec!(850));
    }

    #[test]
    fn overlay_does_not_run_without_a_matching_active_rule_row() {
        let registry = RuleRegistry::new();
        let input = base_input(Market::Taiwan, CalculationType::ForLoan);

        let output = apply_overlays(
            RuleOutput { available: dec!(1000), ..RuleOutput::zero() },
            &input,
            &[RuleTag::BorrowedSharesNoRelending],
            &registry,
            business_date(),
        );
        assert_eq!(output.available, dec!(1000));
    }
}
