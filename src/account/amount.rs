//! Decimal string (de)serialization for [`Amount`] fields.
//!
//! Usage: `#[serde(with = "crate::account::amount::decimal")]`.

use crate::account::types::Amount;

/// Parse a base-10 amount, as returned by chain APIs.
pub fn parse_decimal(value: &str) -> Option<Amount> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Amount::from_str_radix(trimmed, 10).ok()
}

pub mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::parse_decimal;
    use crate::account::types::Amount;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_decimal(&raw).ok_or_else(|| D::Error::custom(format!("invalid decimal amount '{}'", raw)))
    }
}

pub mod decimal_opt {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::parse_decimal;
    use crate::account::types::Amount;

    pub fn serialize<S: Serializer>(value: &Option<Amount>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Amount>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_decimal(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid decimal amount '{}'", raw))),
            None => Ok(None),
        }
    }
}
