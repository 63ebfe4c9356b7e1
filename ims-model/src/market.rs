use serde::{Deserialize, Serialize};

/// Markets the IMS calculation core knows how to apply fixed overlays for.
///
/// `Market` is a closed enum rather than a free-form string so overlay
/// lookup (`ims-inventory::overlay`) can match on it exhaustively - adding a
/// market with its own overlay is a compile-time decision, not a config
/// typo waiting to happen.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    UnitedStates,
    Taiwan,
    Japan,
    HongKong,
    UnitedKingdom,
    Other,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitedStates => "us",
            Self::Taiwan => "tw",
            Self::Japan => "jp",
            Self::HongKong => "hk",
            Self::UnitedKingdom => "uk",
            Self::Other => "other",
        }
    }

    /// Standard settlement cycle in business days for this market absent
    /// any rule overlay (T+2 for most of the majors covered here).
    pub fn standard_settlement_days(&self) -> i64 {
        match self {
            Self::Japan => 2,
            Self::Taiwan => 2,
            Self::HongKong => 2,
            Self::UnitedStates => 1,
            Self::UnitedKingdom => 1,
            Self::Other => 2,
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag attached to a [`CalculationRule`](crate::CalculationRule) identifying
/// which fixed market overlay it corresponds to. Overlays are code, not
/// data - the tag only routes a rule row to the overlay implementation that
/// evaluates it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum RuleTag {
    /// Taiwan: shares sourced from a borrow cannot be re-lent.
    BorrowedSharesNoRelending,
    /// Japan: availability excludes positions that miss the same-day
    /// settlement cutoff.
    SettlementCutoffRules,
    /// Japan: quanto contracts settle on T+2 regardless of the
    /// instrument's standard cycle.
    QuantoSettlementT2,
}

impl RuleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BorrowedSharesNoRelending => "BORROWED_SHARES_NO_RELENDING",
            Self::SettlementCutoffRules => "SETTLEMENT_CUTOFF_RULES",
            Self::QuantoSettlementT2 => "QUANTO_SETTLEMENT_T2",
        }
    }
}

impl std::fmt::Display for RuleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_round_trips_through_json() {
        let json = serde_json::to_string(&Market::Taiwan).unwrap();
        assert_eq!(json, "\"taiwan\"");
        let back: Market = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Market::Taiwan);
    }

    #[test]
    fn rule_tag_display_matches_spec_constant_names() {
        assert_eq!(
            RuleTag::BorrowedSharesNoRelending.to_string(),
            "BORROWED_SHARES_NO_RELENDING"
        );
        assert_eq!(
            RuleTag::QuantoSettlementT2.to_string(),
            "QUANTO_SETTLEMENT_T2"
        );
    }
}
