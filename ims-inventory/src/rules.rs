use ims_core::CoreError;
use ims_model::{BusinessDate, CalculationRule, Market, RuleStatus, RuleTag, RuleType};

/// Holds the full set of [`CalculationRule`] rows and selects the one
/// governing a given `(rule_type, market[, tag])` at a point in time
/// (spec.md §4.3 step 1 / §3's "at most one `ACTIVE` rule" invariant).
///
/// The invariant is scoped to `(rule_type, market)` for `Base` rows, but to
/// `(rule_type, market, tag)` for `Overlay` rows: spec.md §4.3's own
/// example has Japan running two simultaneously-active overlays
/// (`SETTLEMENT_CUTOFF_RULES` and `QUANTO_SETTLEMENT_T2`), so a
/// market-wide overlay exclusivity invariant would be self-contradictory.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<CalculationRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule row, rejecting it with [`CoreError::conflict`] if it
    /// would leave more than one `Active` row effective on the same date
    /// for its `(rule_type, market[, tag])` scope.
    pub fn insert(&mut self, rule: CalculationRule) -> Result<(), CoreError> {
        if rule.status == RuleStatus::Active {
            let overlapping = self.rules.iter().any(|existing| {
                existing.status == RuleStatus::Active
                    && existing.rule_type == rule.rule_type
                    && existing.market == rule.market
                    && existing.tag == rule.tag
                    && effective_windows_overlap(existing, &rule)
            });
            if overlapping {
                return Err(CoreError::conflict(format!(
                    "rule {} conflicts with an already-active rule for the same scope",
                    rule.rule_id
                )));
            }
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Highest-priority `Active` rule of `rule_type` for `market` effective
    /// on `date`, tie-broken by priority then by the later `effective_from`.
    pub fn select_active(
        &self,
        rule_type: RuleType,
        market: Market,
        date: BusinessDate,
    ) -> Option<&CalculationRule> {
        self.candidates(rule_type, market, date, None).into_iter().max_by(rank)
    }

    /// Active overlay rule carrying `tag`, scoped additionally by market
    /// and date - the lookup `ims-inventory::overlays` uses to decide
    /// whether a fixed overlay function should run at all.
    pub fn active_overlay(
        &self,
        tag: RuleTag,
        market: Market,
        date: BusinessDate,
    ) -> Option<&CalculationRule> {
        self.candidates(RuleType::Overlay, market, date, Some(tag))
            .into_iter()
            .max_by(rank)
    }

    fn candidates(
        &self,
        rule_type: RuleType,
        market: Market,
        date: BusinessDate,
        tag: Option<RuleTag>,
    ) -> Vec<&CalculationRule> {
        self.rules
            .iter()
            .filter(|r| {
                r.is_active()
                    && r.rule_type == rule_type
                    && r.market == market
                    && r.is_effective_on(date)
                    && tag.is_none_or(|tag| r.tag == Some(tag))
            })
            .collect()
    }
}

fn rank(a: &&CalculationRule, b: &&CalculationRule) -> std::cmp::Ordering {
    a.priority.cmp(&b.priority).then(a.effective_from.cmp(&b.effective_from))
}

fn effective_windows_overlap(a: &CalculationRule, b: &CalculationRule) -> bool {
    let a_end = a.effective_to.unwrap_or(BusinessDate(chrono::NaiveDate::MAX));
    let b_end = b.effective_to.unwrap_or(BusinessDate(chrono::NaiveDate::MAX));
    a.effective_from <= b_end && b.effective_from <= a_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> BusinessDate {
        BusinessDate(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn rule(
        id: &str,
        rule_type: RuleType,
        tag: Option<RuleTag>,
        market: Market,
        priority: i32,
        from: &str,
        to: Option<&str>,
        status: RuleStatus,
    ) -> CalculationRule {
        CalculationRule {
            rule_id: id.into(),
            version: 1,
            rule_type,
            tag,
            market,
            priority,
            effective_from: date(from),
            effective_to: to.map(date),
            status,
        }
    }

    #[test]
    fn select_active_picks_highest_priority_among_effective_rows() {
        let mut registry = RuleRegistry::new();
        registry
            .insert(rule("R1", RuleType::Base, None, Market::UnitedStates, 5, "2026-01-01", None, RuleStatus::Active))
            .unwrap();
        registry
            .insert(rule("R2", RuleType::Base, None, Market::UnitedStates, 10, "2026-01-01", None, RuleStatus::Retired))
            .unwrap();

        let selected = registry.select_active(RuleType::Base, Market::UnitedStates, date("2026-07-28"));
        assert_eq!(selected.unwrap().rule_id, "R1");
    }

    #[test]
    fn japan_can_hold_two_simultaneously_active_overlays() {
        let mut registry = RuleRegistry::new();
        registry
            .insert(rule(
                "CUTOFF", RuleType::Overlay, Some(RuleTag::SettlementCutoffRules), Market::Japan, 1,
                "2026-01-01", None, RuleStatus::Active,
            ))
            .unwrap();
        let result = registry.insert(rule(
            "QUANTO", RuleType::Overlay, Some(RuleTag::QuantoSettlementT2), Market::Japan, 1,
            "2026-01-01", None, RuleStatus::Active,
        ));
        assert!(result.is_ok());

        assert!(registry
            .active_overlay(RuleTag::SettlementCutoffRules, Market::Japan, date("2026-07-28"))
            .is_some());
        assert!(registry
            .active_overlay(RuleTag::QuantoSettlementT2, Market::Japan, date("2026-07-28"))
            .is_some());
    }

    #[test]
    fn overlapping_active_rules_for_the_same_scope_are_rejected() {
        let mut registry = RuleRegistry::new();
        registry
            .insert(rule("R1", RuleType::Base, None, Market::Taiwan, 1, "2026-01-01", None, RuleStatus::Active))
            .unwrap();
        let result = registry.insert(rule("R2", RuleType::Base, None, Market::Taiwan, 2, "2026-06-01", None, RuleStatus::Active));
        assert_eq!(result.unwrap_err().kind, ims_core::ErrorKind::Conflict);
    }
}
