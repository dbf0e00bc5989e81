//! Hex conversions for every value crossing the JSON-RPC boundary.
//!
//! Quantities are minimal lower-case hex (`0x0` for zero), byte strings are
//! full-byte hex (`0x` for empty) and addresses are EIP-55 checksummed.

use alloy::{
    hex,
    primitives::{Address, Bytes, U256},
};
use serde::{Deserialize, Serialize};

const HEX_PREFIX: &str = "0x";

/// Error type for hex codec operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserOpError {
    #[error("missing 0x prefix: {value:?}")]
    MissingPrefix { value: String },

    #[error("invalid hex byte string {value:?}: {message}")]
    InvalidBytes { value: String, message: String },

    #[error("invalid quantity {value:?}: {message}")]
    InvalidQuantity { value: String, message: String },

    #[error("invalid address {value:?}: {message}")]
    InvalidAddress { value: String, message: String },
}

fn strip_prefix(value: &str) -> Result<&str, UserOpError> {
    value
        .strip_prefix(HEX_PREFIX)
        .ok_or_else(|| UserOpError::MissingPrefix {
            value: value.to_string(),
        })
}

pub fn encode_quantity(value: U256) -> String {
    format!("{HEX_PREFIX}{value:x}")
}

pub fn decode_quantity(value: &str) -> Result<U256, UserOpError> {
    let digits = strip_prefix(value)?;
    if digits.is_empty() || digits.len() > 64 {
        return Err(UserOpError::InvalidQuantity {
            value: value.to_string(),
            message: format!("expected 1 to 64 hex digits, got {}", digits.len()),
        });
    }

    U256::from_str_radix(digits, 16).map_err(|e| UserOpError::InvalidQuantity {
        value: value.to_string(),
        message: e.to_string(),
    })
}

pub fn encode_bytes(value: &[u8]) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(value))
}

pub fn decode_bytes(value: &str) -> Result<Bytes, UserOpError> {
    let digits = strip_prefix(value)?;
    if digits.len() % 2 != 0 {
        return Err(UserOpError::InvalidBytes {
            value: value.to_string(),
            message: "odd number of hex digits".to_string(),
        });
    }

    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| UserOpError::InvalidBytes {
            value: value.to_string(),
            message: e.to_string(),
        })
}

pub fn encode_address(value: Address) -> String {
    value.to_checksum(None)
}

/// Parses a `0x`-prefixed address in any casing.
pub fn decode_address(value: &str) -> Result<Address, UserOpError> {
    let digits = strip_prefix(value)?;
    if digits.len() != 40 {
        return Err(UserOpError::InvalidAddress {
            value: value.to_string(),
            message: format!("expected 40 hex digits, got {}", digits.len()),
        });
    }

    let raw = hex::decode(digits).map_err(|e| UserOpError::InvalidAddress {
        value: value.to_string(),
        message: e.to_string(),
    })?;
    Ok(Address::from_slice(&raw))
}

pub mod quantity {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_quantity(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::decode_quantity(&value).map_err(D::Error::custom)
    }
}

pub mod bytes {
    use alloy::primitives::Bytes;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_bytes(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::decode_bytes(&value).map_err(D::Error::custom)
    }
}

pub mod address {
    use alloy::primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_address(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::decode_address(&value).map_err(D::Error::custom)
    }
}

pub mod option_quantity {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::quantity::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|value| super::decode_quantity(&value).map_err(D::Error::custom))
            .transpose()
    }
}

pub mod option_address {
    use alloy::primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        value: &Option<Address>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::address::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Address>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|value| super::decode_address(&value).map_err(D::Error::custom))
            .transpose()
    }
}
