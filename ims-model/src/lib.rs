//! Core entity model for the IMS calculation core: [`Security`],
//! [`Counterparty`], [`AggregationUnit`], [`Contract`] and
//! [`CalculationRule`], plus the natural-key identifier newtypes the
//! engines use to address them.
//!
//! Cyclic/shared ownership (an entity holding its related entities by
//! reference) is deliberately absent here: every relationship is stored as
//! a key, not a pointer, so the table-per-entity layout can live behind the
//! Distributed Cache without a borrow checker fight. Joins happen
//! explicitly where a rule input envelope is assembled (`ims-inventory`).

pub mod contract;
pub mod ids;
pub mod market;
pub mod party;
pub mod rule;
pub mod security;

pub use contract::{Contract, ContractDirection, ContractKind};
pub use ids::{AggregationUnitId, BookId, BusinessDate, CounterpartyId, OwnerId, SecurityId};
pub use market::{Market, RuleTag};
pub use party::{AggregationUnit, Counterparty, KycStatus};
pub use rule::{CalculationRule, RuleStatus, RuleType};
pub use security::{ExternalIdentifier, IdentifierType, Security};
