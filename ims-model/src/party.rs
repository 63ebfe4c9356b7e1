use crate::ids::{AggregationUnitId, CounterpartyId};
use crate::market::RuleTag;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// KYC/onboarding status of a counterparty. Engines do not enforce this
/// directly - it is carried for downstream risk checks that are out of
/// scope here (spec Non-goals: compliance/KYC workflow).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Verified,
    Pending,
    Restricted,
}

/// A client the Limit Engine tracks a `ClientLimit` for.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Counterparty {
    pub id: CounterpartyId,
    pub legal_name: SmolStr,
    pub kyc_status: KycStatus,
}

/// An aggregation unit (AU) - the trading-desk-level grouping the Limit
/// Engine tracks an `AggregationUnitLimit` for, and the level at which
/// market-specific rule overlays (Taiwan, Japan) key off `rule_tags`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AggregationUnit {
    pub id: AggregationUnitId,
    pub name: SmolStr,
    pub rule_tags: Vec<RuleTag>,
}

impl AggregationUnit {
    pub fn has_rule_tag(&self, tag: RuleTag) -> bool {
        self.rule_tags.contains(&tag)
    }
}
