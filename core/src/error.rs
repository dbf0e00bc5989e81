use alchemy_aa_types::UserOpError;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningErrorKind {
    /// Private key material could not be parsed.
    #[error("invalid private key: {message}")]
    InvalidKey { message: String },

    /// Signature bytes are malformed or do not recover over the digest.
    #[error("invalid signature: {message}")]
    InvalidSignature { message: String },

    #[error("signature recovers to {recovered}, expected {expected}")]
    SignerMismatch {
        expected: Address,
        recovered: Address,
    },

    #[error("signing failed: {message}")]
    SigningFailed { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum AlchemyError {
    /// Hex, ABI or JSON encode/decode failure
    #[error("Encoding error: {message}")]
    EncodingError { message: String },

    #[error("Signing error: {kind}")]
    SigningError { kind: SigningErrorKind },

    /// The node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    RpcError {
        code: i64,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },

    #[error("Transport error: {message}")]
    TransportError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl AlchemyError {
    pub fn encoding(message: impl ToString) -> Self {
        Self::EncodingError {
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl ToString) -> Self {
        Self::ValidationError {
            message: message.to_string(),
        }
    }

    pub fn transport(message: impl ToString) -> Self {
        Self::TransportError {
            message: message.to_string(),
            status: None,
        }
    }

    pub fn signing(kind: SigningErrorKind) -> Self {
        Self::SigningError { kind }
    }
}

impl From<UserOpError> for AlchemyError {
    fn from(error: UserOpError) -> Self {
        Self::encoding(error)
    }
}

impl From<serde_json::Error> for AlchemyError {
    fn from(error: serde_json::Error) -> Self {
        Self::encoding(error)
    }
}
