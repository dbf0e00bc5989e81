use alchemy_aa_types::{UserOperation, codec};
use alchemy_core::{
    constants::DEFAULT_DUMMY_SIGNATURE,
    error::AlchemyError,
    rpc_clients::envelope::{GasAndPaymasterParams, build_gas_and_paymaster_request},
};
use alloy::primitives::{Address, Bytes, U256};

use crate::account_factory::{FactoryCall, build_init_code};

/// Placeholder signature the gateway simulates against while quoting.
///
/// Always 65 bytes so gas estimation sees a realistic signature length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummySignature(Bytes);

impl DummySignature {
    pub fn new(signature: Bytes) -> Result<Self, AlchemyError> {
        if signature.len() != 65 {
            return Err(AlchemyError::validation(format!(
                "Dummy signature must be 65 bytes, got {}",
                signature.len()
            )));
        }
        Ok(Self(signature))
    }

    pub fn from_hex(signature: &str) -> Result<Self, AlchemyError> {
        Self::new(codec::decode_bytes(signature)?)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl Default for DummySignature {
    fn default() -> Self {
        Self(Bytes::copy_from_slice(&DEFAULT_DUMMY_SIGNATURE))
    }
}

pub struct QuoteRequestConfig<'a> {
    pub call_data: Bytes,
    pub owner_address: Address,
    pub account_address: Address,
    pub nonce: U256,
    pub policy_id: &'a str,
    pub entrypoint: Address,
    pub factory_address: Address,
    pub factory_call: &'a FactoryCall,
    pub dummy_signature: &'a DummySignature,
}

/// Serialize an `alchemy_requestGasAndPaymasterAndData` request.
///
/// Gas fields are left at zero and `paymasterAndData` empty for the gateway
/// to fill in.
pub fn build_quote_request(
    config: QuoteRequestConfig<'_>,
    request_id: u64,
) -> Result<Vec<u8>, AlchemyError> {
    let init_code = build_init_code(
        config.owner_address,
        config.factory_address,
        config.factory_call,
    )?;

    let dummy_signature = config.dummy_signature.as_bytes().clone();
    let user_operation =
        UserOperation::new(config.account_address, config.nonce, config.call_data)
            .with_init_code(init_code)
            .into_signed(dummy_signature.clone());

    tracing::debug!(
        policy_id = config.policy_id,
        sender = %config.account_address,
        "Requesting gas and paymaster data"
    );

    build_gas_and_paymaster_request(
        request_id,
        GasAndPaymasterParams {
            policy_id: config.policy_id.to_string(),
            entry_point: config.entrypoint,
            user_operation,
            dummy_signature,
        },
    )
}
