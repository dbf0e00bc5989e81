use std::{fmt, str::FromStr};

use alloy::{
    primitives::{Address, B256, Bytes, Signature},
    signers::{SignerSync, local::PrivateKeySigner},
};

use crate::error::{AlchemyError, SigningErrorKind};

/// Legacy Ethereum offset applied to the recovery id.
const RECOVERY_ID_OFFSET: u8 = 27;

/// Signs a prepared UserOperation digest.
///
/// Implementations receive the final digest and must not hash it again.
pub trait DigestSigner {
    fn sign_digest(&self, digest: &B256) -> Result<Bytes, AlchemyError>;
}

/// Secp256k1 signer backed by a raw private key
#[derive(Clone)]
pub struct LocalUserOpSigner {
    inner: PrivateKeySigner,
}

impl fmt::Debug for LocalUserOpSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalUserOpSigner")
            .field("address", &self.inner.address())
            .finish()
    }
}

impl LocalUserOpSigner {
    /// Parse a hex private key, with or without the `0x` prefix.
    pub fn from_private_key(private_key: &str) -> Result<Self, AlchemyError> {
        let inner = PrivateKeySigner::from_str(private_key.trim()).map_err(|e| {
            AlchemyError::signing(SigningErrorKind::InvalidKey {
                message: e.to_string(),
            })
        })?;

        Ok(Self { inner })
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }
}

impl DigestSigner for LocalUserOpSigner {
    fn sign_digest(&self, digest: &B256) -> Result<Bytes, AlchemyError> {
        let signature = self.inner.sign_hash_sync(digest).map_err(|e| {
            tracing::error!("Error signing userop digest: {:?}", e);
            AlchemyError::signing(SigningErrorKind::SigningFailed {
                message: e.to_string(),
            })
        })?;

        Ok(Bytes::from(encode_signature(&signature)))
    }
}

/// `r || s || v` with `v` in {27, 28}, the layout entry point validators expect.
pub fn encode_signature(signature: &Signature) -> [u8; 65] {
    let mut out = [0u8; 65];
    out[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    out[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    out[64] = signature.v() as u8 + RECOVERY_ID_OFFSET;
    out
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address, AlchemyError> {
    recover_normalized(digest, signature).map(|(signer, _)| signer)
}

/// Recover the signer and re-encode `signature` with `v` in {27, 28}.
///
/// Accepts a raw y-parity (`v` of 0 or 1) as well as the legacy offset form.
pub fn recover_normalized(
    digest: &B256,
    signature: &[u8],
) -> Result<(Address, Bytes), AlchemyError> {
    if signature.len() != 65 {
        return Err(AlchemyError::signing(SigningErrorKind::InvalidSignature {
            message: format!("expected 65 bytes, got {}", signature.len()),
        }));
    }

    let invalid = |message: String| {
        AlchemyError::signing(SigningErrorKind::InvalidSignature { message })
    };

    let parsed = Signature::from_raw(signature).map_err(|e| invalid(e.to_string()))?;
    let signer = parsed
        .recover_address_from_prehash(digest)
        .map_err(|e| invalid(e.to_string()))?;

    Ok((signer, Bytes::from(encode_signature(&parsed))))
}
