use alchemy_aa_types::GasAndPaymasterQuote;

use super::{
    envelope::{
        self, UserOperationLookup, UserOperationReceipt, build_receipt_query,
        build_user_operation_by_hash_query,
    },
    transport::RpcTransport,
};
use crate::error::AlchemyError;

/// A JSON-RPC client for the Alchemy bundler and gas manager endpoints.
///
/// Every call is one envelope out and one envelope in; nothing is retried.
#[derive(Debug, Clone)]
pub struct AlchemyClient<T> {
    transport: T,
}

impl<T: RpcTransport> AlchemyClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request built for `alchemy_requestGasAndPaymasterAndData`.
    pub async fn request_gas_and_paymaster(
        &self,
        request: Vec<u8>,
    ) -> Result<GasAndPaymasterQuote, AlchemyError> {
        let response = self.transport.send(request).await?;
        let quote = envelope::decode_quote_result(&response)?;

        tracing::debug!("Gas and paymaster data received");
        Ok(quote)
    }

    /// Send a signed `eth_sendUserOperation` request, returning the operation hash.
    pub async fn send_user_operation(&self, request: Vec<u8>) -> Result<String, AlchemyError> {
        let response = self.transport.send(request).await?;
        let op_hash = envelope::decode_send_result(&response)?;

        tracing::info!(op_hash = %op_hash, "UserOperation accepted by bundler");
        Ok(op_hash)
    }

    /// `None` until the operation is included on chain.
    pub async fn get_user_operation_receipt(
        &self,
        operation_hash: &str,
        id: u64,
    ) -> Result<Option<UserOperationReceipt>, AlchemyError> {
        let request = build_receipt_query(operation_hash, id)?;
        let response = self.transport.send(request).await?;
        envelope::decode_receipt_result(&response)
    }

    pub async fn get_user_operation_by_hash(
        &self,
        operation_hash: &str,
        id: u64,
    ) -> Result<Option<UserOperationLookup>, AlchemyError> {
        let request = build_user_operation_by_hash_query(operation_hash, id)?;
        let response = self.transport.send(request).await?;
        envelope::decode_user_operation_by_hash(&response)
    }
}
