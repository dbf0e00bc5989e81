use alchemy_aa_types::{GasAndPaymasterQuote, UserOperation, codec};
use alchemy_core::{
    error::{AlchemyError, SigningErrorKind},
    rpc_clients::envelope::build_send_request,
    signer::{DigestSigner, LocalUserOpSigner, recover_normalized},
};
use alloy::primitives::{Address, B256, Bytes, ChainId, U256};
use serde::{Deserialize, Serialize};

use crate::account_factory::{FactoryCall, build_init_code};

pub struct UserOpRequestConfig<'a> {
    pub call_data: Bytes,
    pub quote: &'a GasAndPaymasterQuote,
    pub chain_id: ChainId,
    pub entrypoint: Address,
    /// EOA owning the account, passed to the factory when deploying
    pub owner_address: Address,
    /// Smart account sending the operation
    pub account_address: Address,
    pub nonce: U256,
    /// Zero when the account is already deployed
    pub factory_address: Address,
    pub factory_call: &'a FactoryCall,
}

/// Builds `eth_sendUserOperation` payloads from a gas and paymaster quote.
pub struct UserOpRequestBuilder<'a> {
    config: UserOpRequestConfig<'a>,
}

impl<'a> UserOpRequestBuilder<'a> {
    pub fn new(config: UserOpRequestConfig<'a>) -> Self {
        Self { config }
    }

    fn operation(&self) -> Result<UserOperation, AlchemyError> {
        let init_code = build_init_code(
            self.config.owner_address,
            self.config.factory_address,
            self.config.factory_call,
        )?;

        Ok(UserOperation::new(
            self.config.account_address,
            self.config.nonce,
            self.config.call_data.clone(),
        )
        .with_init_code(init_code)
        .with_quote(self.config.quote))
    }

    /// Sign with `signer` and serialize the request.
    ///
    /// With `append_entrypoint` the entry point becomes the second positional
    /// parameter, as `eth_sendUserOperation` expects.
    pub fn build_signed<S: DigestSigner>(
        self,
        signer: &S,
        request_id: u64,
        append_entrypoint: bool,
    ) -> Result<Vec<u8>, AlchemyError> {
        let userop = self.operation()?;
        let digest = userop.hash(self.config.entrypoint, self.config.chain_id);

        tracing::debug!(digest = %digest, "UserOp built, proceeding with signing");

        let signature = signer.sign_digest(&digest)?;

        tracing::debug!(signature = %signature, "UserOp signed successfully");

        build_send_request(
            request_id,
            userop.into_signed(signature),
            append_entrypoint.then_some(self.config.entrypoint),
        )
    }

    /// First phase of external signing; no key material is involved.
    pub fn prepare(self) -> Result<PendingUserOperation, AlchemyError> {
        let userop = self.operation()?;
        Ok(PendingUserOperation::new(
            userop,
            self.config.entrypoint,
            self.config.chain_id,
        ))
    }
}

/// Single-phase flow with a raw private key.
pub fn build_signed_send_request(
    config: UserOpRequestConfig<'_>,
    request_id: u64,
    private_key: &str,
    append_entrypoint: bool,
) -> Result<Vec<u8>, AlchemyError> {
    let signer = LocalUserOpSigner::from_private_key(private_key)?;
    UserOpRequestBuilder::new(config).build_signed(&signer, request_id, append_entrypoint)
}

/// An operation waiting for an out-of-band signature over [`Self::digest`].
///
/// Fields are read-only; [`finalize_signed`] re-derives the digest from the
/// carried operation and refuses to finalize if the two disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUserOperation {
    operation: UserOperation,
    digest: B256,
    #[serde(with = "codec::address")]
    entrypoint: Address,
    chain_id: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expected_signer: Option<Address>,
}

impl PendingUserOperation {
    fn new(operation: UserOperation, entrypoint: Address, chain_id: ChainId) -> Self {
        let digest = operation.hash(entrypoint, chain_id);
        tracing::debug!(digest = %digest, "UserOp digest ready for external signing");

        Self {
            operation,
            digest,
            entrypoint,
            chain_id,
            expected_signer: None,
        }
    }

    /// Require the phase two signature to recover to `signer`.
    pub fn expect_signer(mut self, signer: Address) -> Self {
        self.expected_signer = Some(signer);
        self
    }

    pub fn digest(&self) -> B256 {
        self.digest
    }

    pub fn operation(&self) -> &UserOperation {
        &self.operation
    }

    pub fn entrypoint(&self) -> Address {
        self.entrypoint
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn expected_signer(&self) -> Option<Address> {
        self.expected_signer
    }
}

/// Phase one: populate everything but the signature and return the digest
/// the account owner must sign.
pub fn prepare_for_signing(
    call_data: Bytes,
    quote: &GasAndPaymasterQuote,
    chain_id: ChainId,
    entrypoint: Address,
    sender: Address,
    nonce: U256,
) -> PendingUserOperation {
    let operation = UserOperation::new(sender, nonce, call_data).with_quote(quote);
    PendingUserOperation::new(operation, entrypoint, chain_id)
}

/// Phase two: attach the external signature and serialize the request with
/// the entry point appended.
///
/// `entrypoint` must be the one the operation was prepared for.
pub fn finalize_signed(
    request_id: u64,
    signature: Bytes,
    pending: PendingUserOperation,
    entrypoint: Address,
) -> Result<Vec<u8>, AlchemyError> {
    if entrypoint != pending.entrypoint {
        return Err(AlchemyError::validation(format!(
            "Operation was prepared for entry point {}, not {entrypoint}",
            pending.entrypoint
        )));
    }

    let PendingUserOperation {
        operation,
        digest,
        chain_id,
        expected_signer,
        ..
    } = pending;

    if operation.hash(entrypoint, chain_id) != digest {
        return Err(AlchemyError::validation(
            "Pending UserOperation no longer matches its digest",
        ));
    }

    // Wire form always carries v in {27, 28}, whatever the external signer produced
    let (recovered, signature) = recover_normalized(&digest, &signature)?;
    if let Some(expected) = expected_signer {
        if recovered != expected {
            return Err(AlchemyError::signing(SigningErrorKind::SignerMismatch {
                expected,
                recovered,
            }));
        }
    }

    tracing::debug!(signer = %recovered, "External signature accepted");

    build_send_request(request_id, operation.into_signed(signature), Some(entrypoint))
}
