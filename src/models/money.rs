//! Serde helpers for money fields in request bodies.
//!
//! Amounts arrive as JSON strings (`"12.34"`) or numbers (`12.34`). Numbers are read through
//! their shortest decimal text so `12.34` stays `12.34` instead of its binary expansion.

use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl Amount {
    fn into_decimal<E: de::Error>(self) -> Result<BigDecimal, E> {
        let text = match self {
            Amount::Text(s) => s.trim().to_string(),
            Amount::Number(n) => n.to_string(),
        };
        BigDecimal::from_str(&text).map_err(|_| E::custom(format!("invalid amount: {:?}", text)))
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    Amount::deserialize(deserializer)?.into_decimal()
}

/// For `Option<BigDecimal>` fields; pair with `#[serde(default)]`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Amount>::deserialize(deserializer)?
        .map(Amount::into_decimal)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(deserialize_with = "deserialize")]
        amount: BigDecimal,
        #[serde(default, deserialize_with = "deserialize_optional")]
        goal: Option<BigDecimal>,
    }

    fn parse(json: &str) -> Body {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn numbers_keep_their_written_decimals() {
        let b = parse(r#"{"amount": 12.34, "goal": 0.1}"#);
        assert_eq!(b.amount, BigDecimal::from_str("12.34").unwrap());
        assert_eq!(b.amount.as_bigint_and_exponent().1, 2);
        assert_eq!(b.goal, Some(BigDecimal::from_str("0.1").unwrap()));
    }

    #[test]
    fn strings_integers_and_null() {
        let b = parse(r#"{"amount": " 25.50 ", "goal": null}"#);
        assert_eq!(b.amount, BigDecimal::from_str("25.5").unwrap());
        assert_eq!(b.goal, None);

        let b = parse(r#"{"amount": 500}"#);
        assert_eq!(b.amount, BigDecimal::from(500));
        assert_eq!(b.goal, None);
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(serde_json::from_str::<Body>(r#"{"amount": "ten"}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"amount": true}"#).is_err());
    }
}
