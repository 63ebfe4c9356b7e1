use crate::ids::{BookId, BusinessDate, CounterpartyId, SecurityId};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The financing instrument behind a stock loan contract.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractKind {
    /// Securities borrowing and lending.
    Sbl,
    /// Repurchase agreement.
    Repo,
    /// Total return / financing swap.
    Swap,
}

/// Which side of the contract the book is on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractDirection {
    Borrow,
    Loan,
}

/// A securities financing contract (stock loan, repo or swap leg) that
/// contributes to a security's inventory. Quantity is always positive;
/// `direction` determines whether it increases (Loan) or decreases
/// (Borrow) the firm's own inventory of the security.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Contract {
    pub contract_id: smol_str::SmolStr,
    pub security_id: SecurityId,
    pub book_id: BookId,
    pub counterparty_id: CounterpartyId,
    pub kind: ContractKind,
    pub direction: ContractDirection,
    pub quantity: Decimal,
    pub start_date: BusinessDate,
    /// `None` for an open-term contract with no fixed maturity.
    pub maturity_date: Option<BusinessDate>,
    pub rollable: bool,
}

impl Contract {
    pub fn is_open_term(&self) -> bool {
        self.maturity_date.is_none()
    }

    pub fn is_expired(&self, as_of: BusinessDate) -> bool {
        match self.maturity_date {
            Some(maturity) => maturity < as_of,
            None => false,
        }
    }
}
