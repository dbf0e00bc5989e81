use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::codec;

/// Gas limits, fees and paymaster sponsorship returned by
/// `alchemy_requestGasAndPaymasterAndData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasAndPaymasterQuote {
    #[serde(with = "codec::quantity")]
    pub pre_verification_gas: U256,
    #[serde(with = "codec::quantity")]
    pub call_gas_limit: U256,
    #[serde(with = "codec::quantity")]
    pub verification_gas_limit: U256,
    #[serde(with = "codec::bytes")]
    pub paymaster_and_data: Bytes,
    #[serde(with = "codec::quantity")]
    pub max_fee_per_gas: U256,
    #[serde(with = "codec::quantity")]
    pub max_priority_fee_per_gas: U256,
}
