//! Lenient numeric request fields.
//!
//! Clients send numbers either as JSON numbers or as numeric strings
//! (`"7"`, `"100.5"`); every route accepts both.

use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => format!("\"{}\"", s),
        }
    }
}

/// A finite number.
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Numeric::deserialize(deserializer)?;
    raw.value()
        .filter(|n| n.is_finite())
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {}", raw.describe())))
}

/// A non-negative whole number that fits in `u32`.
pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = Numeric::deserialize(deserializer)?;
    match raw.value() {
        Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => Ok(n as u32),
        _ => Err(D::Error::custom(format!(
            "expected a non-negative whole number, got {}",
            raw.describe()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(deserialize_with = "number")]
        amount: f64,
        #[serde(deserialize_with = "count")]
        items: u32,
    }

    fn parse(body: &str) -> Result<Params, serde_json::Error> {
        serde_json::from_str(body)
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let p = parse(r#"{"amount": 100, "items": 4}"#).unwrap();
        assert_eq!((p.amount, p.items), (100.0, 4));

        let p = parse(r#"{"amount": " 12.5 ", "items": "7"}"#).unwrap();
        assert_eq!((p.amount, p.items), (12.5, 7));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(parse(r#"{"amount": "lots", "items": 1}"#).is_err());
        assert!(parse(r#"{"amount": "NaN", "items": 1}"#).is_err());
        assert!(parse(r#"{"amount": true, "items": 1}"#).is_err());
    }

    #[test]
    fn test_count_must_be_whole_and_in_range() {
        assert!(parse(r#"{"amount": 1, "items": -3}"#).is_err());
        assert!(parse(r#"{"amount": 1, "items": "-3"}"#).is_err());
        assert!(parse(r#"{"amount": 1, "items": 2.5}"#).is_err());
        assert!(parse(r#"{"amount": 1, "items": 4294967296}"#).is_err());
        assert_eq!(parse(r#"{"amount": 1, "items": 4294967295}"#).unwrap().items, u32::MAX);
    }
}
