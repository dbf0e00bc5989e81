//! JSON-RPC 2.0 request and response envelopes for the account abstraction
//! methods served by the Alchemy gateway.

use alchemy_aa_types::{GasAndPaymasterQuote, SignedUserOperation, codec};
use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    constants::{
        JSONRPC_VERSION, METHOD_GET_USER_OPERATION_BY_HASH, METHOD_GET_USER_OPERATION_RECEIPT,
        METHOD_REQUEST_GAS_AND_PAYMASTER, METHOD_SEND_USER_OPERATION,
    },
    error::AlchemyError,
};

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<P> {
    pub id: u64,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> JsonRpcRequest<P> {
    pub fn new(id: u64, method: &'static str, params: P) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AlchemyError> {
        serde_json::to_vec(self).map_err(|e| {
            tracing::error!("Error serializing {} request: {}", self.method, e);
            AlchemyError::encoding(e)
        })
    }
}

/// Positional parameters of `eth_sendUserOperation`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SendUserOperationParams {
    OperationOnly([SignedUserOperation; 1]),
    WithEntryPoint(
        SignedUserOperation,
        #[serde(with = "codec::address")] Address,
    ),
}

impl SendUserOperationParams {
    pub fn new(op: SignedUserOperation, entrypoint: Option<Address>) -> Self {
        match entrypoint {
            Some(entrypoint) => Self::WithEntryPoint(op, entrypoint),
            None => Self::OperationOnly([op]),
        }
    }
}

/// Single parameter object of `alchemy_requestGasAndPaymasterAndData`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasAndPaymasterParams {
    pub policy_id: String,
    #[serde(with = "codec::address")]
    pub entry_point: Address,
    pub user_operation: SignedUserOperation,
    #[serde(with = "codec::bytes")]
    pub dummy_signature: Bytes,
}

pub fn build_send_request(
    id: u64,
    op: SignedUserOperation,
    entrypoint: Option<Address>,
) -> Result<Vec<u8>, AlchemyError> {
    JsonRpcRequest::new(
        id,
        METHOD_SEND_USER_OPERATION,
        SendUserOperationParams::new(op, entrypoint),
    )
    .to_bytes()
}

pub fn build_gas_and_paymaster_request(
    id: u64,
    params: GasAndPaymasterParams,
) -> Result<Vec<u8>, AlchemyError> {
    JsonRpcRequest::new(id, METHOD_REQUEST_GAS_AND_PAYMASTER, [params]).to_bytes()
}

pub fn build_receipt_query(operation_hash: &str, id: u64) -> Result<Vec<u8>, AlchemyError> {
    JsonRpcRequest::new(id, METHOD_GET_USER_OPERATION_RECEIPT, [operation_hash]).to_bytes()
}

pub fn build_user_operation_by_hash_query(
    operation_hash: &str,
    id: u64,
) -> Result<Vec<u8>, AlchemyError> {
    JsonRpcRequest::new(id, METHOD_GET_USER_OPERATION_BY_HASH, [operation_hash]).to_bytes()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl<T: DeserializeOwned> JsonRpcResponse<T> {
    pub fn from_slice(response: &[u8]) -> Result<Self, AlchemyError> {
        serde_json::from_slice(response).map_err(|e| {
            tracing::error!("Error deserializing JSON-RPC response: {}", e);
            AlchemyError::encoding(e)
        })
    }

    /// A non-zero error code fails the call even when a result is present.
    pub fn into_result(self) -> Result<Option<T>, AlchemyError> {
        match self.error {
            Some(error) if error.code != 0 => Err(AlchemyError::RpcError {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
            _ => Ok(self.result),
        }
    }
}

/// Result of `eth_getUserOperationReceipt` once the operation is mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    #[serde(default)]
    pub user_op_hash: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "codec::option_quantity"
    )]
    pub actual_gas_cost: Option<U256>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "codec::option_quantity"
    )]
    pub actual_gas_used: Option<U256>,
}

/// Result of `eth_getUserOperationByHash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationLookup {
    #[serde(default)]
    pub user_operation: serde_json::Value,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "codec::option_address"
    )]
    pub entry_point: Option<Address>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "codec::option_quantity"
    )]
    pub block_number: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
}

fn require_result<T>(result: Option<T>, method: &str) -> Result<T, AlchemyError> {
    result.ok_or_else(|| AlchemyError::encoding(format!("{method} response has no result")))
}

/// Decode the operation hash returned by `eth_sendUserOperation`.
pub fn decode_send_result(response: &[u8]) -> Result<String, AlchemyError> {
    let result = JsonRpcResponse::<String>::from_slice(response)?.into_result()?;
    require_result(result, METHOD_SEND_USER_OPERATION)
}

/// `None` while the operation is not yet mined.
pub fn decode_receipt_result(response: &[u8]) -> Result<Option<UserOperationReceipt>, AlchemyError> {
    JsonRpcResponse::<UserOperationReceipt>::from_slice(response)?.into_result()
}

pub fn decode_quote_result(response: &[u8]) -> Result<GasAndPaymasterQuote, AlchemyError> {
    let result = JsonRpcResponse::<GasAndPaymasterQuote>::from_slice(response)?.into_result()?;
    require_result(result, METHOD_REQUEST_GAS_AND_PAYMASTER)
}

pub fn decode_user_operation_by_hash(
    response: &[u8],
) -> Result<Option<UserOperationLookup>, AlchemyError> {
    JsonRpcResponse::<UserOperationLookup>::from_slice(response)?.into_result()
}

#[cfg(test)]
mod tests {
    use alchemy_aa_types::UserOperation;
    use alloy::primitives::{address, bytes};
    use serde_json::{Value, json};

    use super::*;

    const ENTRYPOINT: Address = address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

    fn signed_op() -> SignedUserOperation {
        UserOperation::new(
            address!("0x9406Cc6185a346906296840746125a0E44976454"),
            U256::from(1),
            bytes!("b61d27f6"),
        )
        .into_signed(bytes!("aabb"))
    }

    #[test]
    fn test_send_request_envelope() {
        let payload = build_send_request(4, signed_op(), Some(ENTRYPOINT)).unwrap();
        let value: Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["id"], 4);
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "eth_sendUserOperation");
        assert_eq!(value["params"].as_array().unwrap().len(), 2);
        assert_eq!(value["params"][0]["signature"], "0xaabb");
        assert_eq!(
            value["params"][1],
            "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"
        );
    }

    #[test]
    fn test_send_request_without_entrypoint() {
        let payload = build_send_request(4, signed_op(), None).unwrap();
        let value: Value = serde_json::from_slice(&payload).unwrap();

        let params = value["params"].as_array().unwrap();
        assert_eq!(params.len(), 1);
        assert!(params[0].is_object());
    }

    #[test]
    fn test_envelope_key_order() {
        let payload = build_receipt_query("0x01", 11).unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"id":11,"jsonrpc":"2.0","method":"eth_getUserOperationReceipt","params":["0x01"]}"#
        );
    }

    #[test]
    fn test_user_operation_by_hash_query() {
        let payload = build_user_operation_by_hash_query("0xabcd", 3).unwrap();
        let value: Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["method"], "eth_getUserOperationByHash");
        assert_eq!(value["params"], json!(["0xabcd"]));
    }

    #[test]
    fn test_decode_send_result_success() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": "0x31b09cc37a91866b493ee9a31980e90b94b09195a85599f5e6d6a246c9e20186"
        });

        let hash = decode_send_result(&serde_json::to_vec(&response).unwrap()).unwrap();
        assert_eq!(
            hash,
            "0x31b09cc37a91866b493ee9a31980e90b94b09195a85599f5e6d6a246c9e20186"
        );
    }

    #[test]
    fn test_decode_send_result_rpc_error() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": { "code": 3, "message": "x" }
        });

        let error = decode_send_result(&serde_json::to_vec(&response).unwrap()).unwrap_err();
        assert_eq!(
            error,
            AlchemyError::RpcError {
                code: 3,
                message: "x".to_string(),
                data: None,
            }
        );
    }

    #[test]
    fn test_error_code_wins_over_result() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": "0x01",
            "error": { "code": -32500, "message": "AA21 didn't pay prefund" }
        });

        let error = decode_send_result(&serde_json::to_vec(&response).unwrap()).unwrap_err();
        assert!(matches!(error, AlchemyError::RpcError { code: -32500, .. }));
    }

    #[test]
    fn test_zero_error_code_is_ignored() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": "0x01",
            "error": { "code": 0, "message": "" }
        });

        assert_eq!(
            decode_send_result(&serde_json::to_vec(&response).unwrap()).unwrap(),
            "0x01"
        );
    }

    #[test]
    fn test_decode_send_result_missing_result() {
        let error = decode_send_result(br#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(matches!(error, AlchemyError::EncodingError { .. }));
    }

    #[test]
    fn test_decode_send_result_malformed_json() {
        let error = decode_send_result(b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(error, AlchemyError::EncodingError { .. }));
    }

    #[test]
    fn test_decode_receipt_pending_and_mined() {
        assert_eq!(
            decode_receipt_result(br#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap(),
            None
        );
        assert_eq!(
            decode_receipt_result(br#"{"jsonrpc":"2.0","id":1}"#).unwrap(),
            None
        );

        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "userOpHash": "0x5fad93d239e4e7a7dd634822513b27f04e57ed8ea1be7b3e74df177eefd8beb8",
                "success": true,
                "actualGasCost": "0x1b2c",
                "actualGasUsed": "0x5208",
                "receipt": { "status": "0x1" }
            }
        });
        let receipt = decode_receipt_result(&serde_json::to_vec(&response).unwrap())
            .unwrap()
            .unwrap();

        assert!(receipt.success);
        assert_eq!(
            receipt.user_op_hash,
            "0x5fad93d239e4e7a7dd634822513b27f04e57ed8ea1be7b3e74df177eefd8beb8"
        );
        assert_eq!(receipt.actual_gas_used, Some(U256::from(21_000)));
        assert_eq!(receipt.reason, None);
    }

    #[test]
    fn test_decode_receipt_rpc_error() {
        let response = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid hash"}}"#;
        let error = decode_receipt_result(response).unwrap_err();
        assert!(matches!(error, AlchemyError::RpcError { code: -32602, .. }));
    }

    #[test]
    fn test_decode_quote_result() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "preVerificationGas": "0xc350",
                "callGasLimit": "0x5208",
                "verificationGasLimit": "0x186a0",
                "paymasterAndData": "0xc03aac639bb21233e0139381970328db8bceeb67",
                "maxFeePerGas": "0x77359400",
                "maxPriorityFeePerGas": "0x3b9aca00"
            }
        });

        let quote = decode_quote_result(&serde_json::to_vec(&response).unwrap()).unwrap();
        assert_eq!(quote.call_gas_limit, U256::from(21_000));
        assert_eq!(quote.paymaster_and_data.len(), 20);
    }

    #[test]
    fn test_decode_user_operation_by_hash() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "userOperation": { "sender": "0x9406Cc6185a346906296840746125a0E44976454" },
                "entryPoint": "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789",
                "blockNumber": "0x10",
                "blockHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "transactionHash": "0x2222222222222222222222222222222222222222222222222222222222222222"
            }
        });

        let lookup = decode_user_operation_by_hash(&serde_json::to_vec(&response).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(lookup.entry_point, Some(ENTRYPOINT));
        assert_eq!(lookup.block_number, Some(U256::from(16)));
        assert_eq!(
            lookup.user_operation["sender"],
            "0x9406Cc6185a346906296840746125a0E44976454"
        );
    }

    #[test]
    fn test_receipt_gas_fields_must_be_hex_quantities() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "userOpHash": "0x01",
                "success": false,
                "reason": "AA23 reverted",
                "actualGasUsed": "21000"
            }
        });

        let error = decode_receipt_result(&serde_json::to_vec(&response).unwrap()).unwrap_err();
        assert!(matches!(error, AlchemyError::EncodingError { .. }));
    }
}
