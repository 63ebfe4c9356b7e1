use crate::calculation_type::CalculationType;
use ims_model::{AggregationUnitId, BusinessDate, CounterpartyId, SecurityId};
use serde::{Deserialize, Serialize};

/// Natural key for an [`crate::Inventory`] record: `(security_id,
/// counterparty_id?, AU_id?, business_date, calculation_type)` (spec.md §3).
/// `counterparty_id` and `au_id` are both optional since a `FOR_LOAN`/
/// `FOR_PLEDGE` calculation is firm-wide while `SHORT_SELL`/`LOCATE` are
/// scoped to a specific client or aggregation unit.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct InventoryKey {
    pub security_id: SecurityId,
    pub counterparty_id: Option<CounterpartyId>,
    pub au_id: Option<AggregationUnitId>,
    pub business_date: BusinessDate,
    pub calc_type: CalculationType,
}

impl InventoryKey {
    pub fn new(
        security_id: SecurityId,
        counterparty_id: Option<CounterpartyId>,
        au_id: Option<AggregationUnitId>,
        business_date: BusinessDate,
        calc_type: CalculationType,
    ) -> Self {
        Self {
            security_id,
            counterparty_id,
            au_id,
            business_date,
            calc_type,
        }
    }

    /// Formatted cache key: `inventory:{security}|{cpty}|{au}|{date}|{calc_type}`,
    /// with `-` standing in for an absent counterparty or AU so the shape
    /// stays fixed-arity (spec.md §4.5's deterministic string-tuple keys).
    pub fn cache_key(&self) -> String {
        format!(
            "inventory:{}|{}|{}|{}|{}",
            self.security_id,
            self.counterparty_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            self.au_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            self.business_date,
            self.calc_type,
        )
    }
}
