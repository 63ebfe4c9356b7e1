use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The two order sides the Limit Engine validates/accounts for (spec.md
/// §4.4). Any other `order_type` string is rejected with
/// [`ims_core::ErrorKind::Validation`] before it reaches the engine -
/// there is no variant for it here, by design.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    LongSell,
    ShortSell,
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LONG_SELL" => Ok(OrderSide::LongSell),
            "SHORT_SELL" => Ok(OrderSide::ShortSell),
            other => Err(format!("unsupported order type {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_two_recognised_sides() {
        assert_eq!("LONG_SELL".parse::<OrderSide>().unwrap(), OrderSide::LongSell);
        assert_eq!("SHORT_SELL".parse::<OrderSide>().unwrap(), OrderSide::ShortSell);
    }

    #[test]
    fn rejects_anything_else() {
        assert!("BUY".parse::<OrderSide>().is_err());
    }
}
