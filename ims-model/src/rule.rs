use crate::ids::BusinessDate;
use crate::market::{Market, RuleTag};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Lifecycle status of a [`CalculationRule`]. Only `Active` rows are
/// eligible for selection by the rule registry (`ims-inventory::rules`).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Draft,
    Active,
    Retired,
}

/// What kind of calculation a rule overlays. `Overlay` rules apply one of
/// the three fixed market overlays named in `tag`; `Base` rules are the
/// default availability formula with no market-specific adjustment.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Base,
    Overlay,
}

/// A versioned row governing how the Inventory Engine computes
/// availability for a `(market, rule_type)` pair. At most one row may be
/// `Active` for a given `(rule_type, market)` at any time - the registry
/// enforces this, not the type itself, since enforcement requires seeing
/// the full rule set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalculationRule {
    pub rule_id: SmolStr,
    pub version: u32,
    pub rule_type: RuleType,
    pub tag: Option<RuleTag>,
    pub market: Market,
    pub priority: i32,
    pub effective_from: BusinessDate,
    pub effective_to: Option<BusinessDate>,
    pub status: RuleStatus,
}

impl CalculationRule {
    pub fn is_effective_on(&self, date: BusinessDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(to) => date <= to,
            None => true,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, RuleStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rule(effective_from: &str, effective_to: Option<&str>) -> CalculationRule {
        let parse = |s: &str| BusinessDate(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap());
        CalculationRule {
            rule_id: "RULE-TW-1".into(),
            version: 1,
            rule_type: RuleType::Overlay,
            tag: Some(RuleTag::BorrowedSharesNoRelending),
            market: Market::Taiwan,
            priority: 10,
            effective_from: parse(effective_from),
            effective_to: effective_to.map(parse),
            status: RuleStatus::Active,
        }
    }

    #[test]
    fn effective_window_is_inclusive_on_both_ends() {
        let r = rule("2026-01-01", Some("2026-12-31"));
        assert!(r.is_effective_on(BusinessDate(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())));
        assert!(r.is_effective_on(BusinessDate(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap())));
        assert!(!r.is_effective_on(BusinessDate(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap())));
    }

    #[test]
    fn open_ended_rule_has_no_upper_bound() {
        let r = rule("2026-01-01", None);
        assert!(r.is_effective_on(BusinessDate(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap())));
    }
}
