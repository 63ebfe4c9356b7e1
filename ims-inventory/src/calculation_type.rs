use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The five inventory calculation types named in spec.md §3.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationType {
    ForLoan,
    ForPledge,
    ShortSell,
    Locate,
    Overborrow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&CalculationType::ForLoan).unwrap();
        assert_eq!(json, "\"FOR_LOAN\"");
    }
}
