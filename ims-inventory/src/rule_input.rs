use crate::calculation_type::CalculationType;
use ims_model::{BusinessDate, Contract, KycStatus, Market, SecurityId};
use rust_decimal::Decimal;

/// Stable input envelope assembled by the Inventory Engine before executing
/// a [`CalculationRule`](ims_model::CalculationRule) (spec.md §4.3 step 2):
/// position, contracts filtered by direction/status, a market-data
/// snapshot, counterparty/AU flags and the market tag. Everything the base
/// formula and the overlays need is carried here so both stay pure
/// functions of `RuleInput`.
#[derive(Debug, Clone)]
pub struct RuleInput {
    pub security_id: SecurityId,
    pub calc_type: CalculationType,
    pub business_date: BusinessDate,
    pub market: Market,
    /// The security's projected net position for `business_date`, as
    /// produced by the Position Engine.
    pub projected_position_qty: Decimal,
    /// Contracts already filtered to those relevant to `calc_type`, not
    /// expired as of `business_date`.
    pub contracts: Vec<Contract>,
    pub counterparty_kyc: Option<KycStatus>,
    /// Whether the position/inventory being calculated originated from an
    /// external data source (a vendor feed) rather than the firm's own
    /// internal booking. Drives the Taiwan `BORROWED_SHARES_NO_RELENDING`
    /// overlay (spec.md §4.3: "if source is external and
    /// `calc_type = FOR_LOAN`, force `available = 0`").
    pub is_external_source: bool,
    /// Day-0 settlement-ladder deliver quantity, needed by the Japan
    /// `SETTLEMENT_CUTOFF_RULES` overlay to reclassify T+0 into T+1.
    pub sd0_deliver_qty: Decimal,
    /// Whether `business_date`'s market cutoff has already passed.
    pub past_settlement_cutoff: bool,
    /// Quantity tagged as a quanto contract, relevant to the Japan
    /// `QUANTO_SETTLEMENT_T2` overlay.
    pub quanto_qty: Decimal,
    /// Whether the quanto-tagged quantity has already settled into its
    /// forced T+2 ladder slot.
    pub quanto_on_t2_slot: bool,
}
