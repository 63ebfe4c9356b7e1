use crate::ids::SecurityId;
use crate::market::Market;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The identifier namespaces a [`Security`] can be looked up by in addition
/// to its stable `internal_id`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    Isin,
    Cusip,
    Sedol,
    Ticker,
    Bloomberg,
}

/// One external identifier a [`Security`] is known by. Several sources can
/// publish the same identifier type with conflicting values; `priority`
/// breaks the tie deterministically (lower wins).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Constructor)]
pub struct ExternalIdentifier {
    pub id_type: IdentifierType,
    pub value: SmolStr,
    pub source: SmolStr,
    pub priority: u16,
}

/// A security the calculation core can hold positions, inventory and
/// limits against. `internal_id` is the stable key every engine addresses
/// by - external identifiers are carried for reference lookups only and
/// never appear in a position, inventory or limit natural key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Security {
    pub internal_id: SecurityId,
    pub currency: SmolStr,
    pub market: Market,
    pub active: bool,
    pub external_ids: Vec<ExternalIdentifier>,
}

impl Security {
    pub fn new(internal_id: SecurityId, currency: impl Into<SmolStr>, market: Market) -> Self {
        Self {
            internal_id,
            currency: currency.into(),
            market,
            active: true,
            external_ids: Vec::new(),
        }
    }

    /// Highest-priority (lowest `priority` value) identifier of the given
    /// type, if the security carries one.
    pub fn preferred_identifier(&self, id_type: IdentifierType) -> Option<&ExternalIdentifier> {
        self.external_ids
            .iter()
            .filter(|ext| ext.id_type == id_type)
            .min_by_key(|ext| ext.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_identifier_picks_lowest_priority() {
        let mut security = Security::new(SecurityId::from("SEC-1"), "USD", Market::UnitedStates);
        security.external_ids.push(ExternalIdentifier::new(
            IdentifierType::Ticker,
            "AAA".into(),
            "vendor-a".into(),
            5,
        ));
        security.external_ids.push(ExternalIdentifier::new(
            IdentifierType::Ticker,
            "BBB".into(),
            "vendor-b".into(),
            1,
        ));

        let preferred = security.preferred_identifier(IdentifierType::Ticker).unwrap();
        assert_eq!(preferred.value, "BBB");
    }

    #[test]
    fn preferred_identifier_absent_for_unknown_type() {
        let security = Security::new(SecurityId::from("SEC-1"), "USD", Market::UnitedStates);
        assert!(security.preferred_identifier(IdentifierType::Isin).is_none());
    }
}
