use alloy::{
    primitives::{Address, B256, Bytes, ChainId, U256, keccak256},
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};

use crate::{codec, quote::GasAndPaymasterQuote};

/// An entry point v0.6 UserOperation before signing.
///
/// There is no signature field here: the digest is computed from this type
/// alone, and signing consumes it into a [`SignedUserOperation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    #[serde(with = "codec::address")]
    pub sender: Address,
    #[serde(with = "codec::quantity")]
    pub nonce: U256,
    #[serde(with = "codec::bytes")]
    pub init_code: Bytes,
    #[serde(with = "codec::bytes")]
    pub call_data: Bytes,
    #[serde(with = "codec::quantity")]
    pub call_gas_limit: U256,
    #[serde(with = "codec::quantity")]
    pub verification_gas_limit: U256,
    #[serde(with = "codec::quantity")]
    pub pre_verification_gas: U256,
    #[serde(with = "codec::quantity")]
    pub max_fee_per_gas: U256,
    #[serde(with = "codec::quantity")]
    pub max_priority_fee_per_gas: U256,
    #[serde(with = "codec::bytes")]
    pub paymaster_and_data: Bytes,
}

/// A UserOperation carrying its signature, ready for `eth_sendUserOperation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUserOperation {
    #[serde(flatten)]
    pub operation: UserOperation,
    #[serde(with = "codec::bytes")]
    pub signature: Bytes,
}

impl UserOperation {
    /// Operation with zeroed gas fields, no init code and no paymaster.
    pub fn new(sender: Address, nonce: U256, call_data: Bytes) -> Self {
        Self {
            sender,
            nonce,
            init_code: Bytes::new(),
            call_data,
            call_gas_limit: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            pre_verification_gas: U256::ZERO,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster_and_data: Bytes::new(),
        }
    }

    pub fn with_init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = init_code;
        self
    }

    /// Copy gas limits, fees and paymaster data from a quote.
    pub fn with_quote(mut self, quote: &GasAndPaymasterQuote) -> Self {
        self.call_gas_limit = quote.call_gas_limit;
        self.verification_gas_limit = quote.verification_gas_limit;
        self.pre_verification_gas = quote.pre_verification_gas;
        self.max_fee_per_gas = quote.max_fee_per_gas;
        self.max_priority_fee_per_gas = quote.max_priority_fee_per_gas;
        self.paymaster_and_data = quote.paymaster_and_data.clone();
        self
    }

    pub fn hash(&self, entrypoint: Address, chain_id: ChainId) -> B256 {
        compute_user_op_hash(self, entrypoint, chain_id)
    }

    pub fn into_signed(self, signature: Bytes) -> SignedUserOperation {
        SignedUserOperation {
            operation: self,
            signature,
        }
    }
}

/// Compute the entry point v0.6 UserOperation hash that the owner signs.
pub fn compute_user_op_hash(op: &UserOperation, entrypoint: Address, chain_id: ChainId) -> B256 {
    // Byte fields enter the tuple as their hashes
    let init_code_hash = keccak256(&op.init_code);
    let call_data_hash = keccak256(&op.call_data);
    let paymaster_and_data_hash = keccak256(&op.paymaster_and_data);

    let inner_tuple = (
        op.sender,
        op.nonce,
        init_code_hash,
        call_data_hash,
        op.call_gas_limit,
        op.verification_gas_limit,
        op.pre_verification_gas,
        op.max_fee_per_gas,
        op.max_priority_fee_per_gas,
        paymaster_and_data_hash,
    );
    let inner_hash = keccak256(inner_tuple.abi_encode());

    let outer_tuple = (inner_hash, entrypoint, U256::from(chain_id));
    keccak256(outer_tuple.abi_encode())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256, bytes};
    use serde_json::json;

    use super::*;

    const ENTRYPOINT: Address = address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");
    const SEPOLIA: ChainId = 11_155_111;

    fn sample_op() -> UserOperation {
        UserOperation {
            sender: address!("0x9406Cc6185a346906296840746125a0E44976454"),
            nonce: U256::from(7),
            init_code: Bytes::new(),
            call_data: bytes!("b61d27f6"),
            call_gas_limit: U256::from(21_000),
            verification_gas_limit: U256::from(100_000),
            pre_verification_gas: U256::from(50_000),
            max_fee_per_gas: U256::from(2_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            paymaster_and_data: Bytes::new(),
        }
    }

    #[test]
    fn test_hash_matches_reference_vector() {
        assert_eq!(
            sample_op().hash(ENTRYPOINT, SEPOLIA),
            b256!("0xdb9e78d516d5d6dbffb6d3fb639445d9ccfdbc6c4e8d356523b45ae7959d541c")
        );
        assert_eq!(
            sample_op().hash(ENTRYPOINT, 1),
            b256!("0xb74908ddb0ba14785dc5dd3eae303751fe6c80a16075a63909bbf0ee750674b3")
        );
    }

    #[test]
    fn test_hash_matches_word_by_word_encoding() {
        let op = sample_op().with_init_code(bytes!("0011"));

        let word = |value: U256| value.to_be_bytes::<32>();
        let address_word = |address: Address| {
            let mut out = [0u8; 32];
            out[12..].copy_from_slice(address.as_slice());
            out
        };

        let mut inner = Vec::with_capacity(320);
        inner.extend_from_slice(&address_word(op.sender));
        inner.extend_from_slice(&word(op.nonce));
        inner.extend_from_slice(keccak256(&op.init_code).as_slice());
        inner.extend_from_slice(keccak256(&op.call_data).as_slice());
        inner.extend_from_slice(&word(op.call_gas_limit));
        inner.extend_from_slice(&word(op.verification_gas_limit));
        inner.extend_from_slice(&word(op.pre_verification_gas));
        inner.extend_from_slice(&word(op.max_fee_per_gas));
        inner.extend_from_slice(&word(op.max_priority_fee_per_gas));
        inner.extend_from_slice(keccak256(&op.paymaster_and_data).as_slice());
        assert_eq!(inner.len(), 320);

        let mut outer = Vec::with_capacity(96);
        outer.extend_from_slice(keccak256(&inner).as_slice());
        outer.extend_from_slice(&address_word(ENTRYPOINT));
        outer.extend_from_slice(&word(U256::from(SEPOLIA)));

        assert_eq!(op.hash(ENTRYPOINT, SEPOLIA), keccak256(&outer));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let op = sample_op();
        assert_eq!(op.hash(ENTRYPOINT, SEPOLIA), op.hash(ENTRYPOINT, SEPOLIA));
    }

    #[test]
    fn test_hash_binds_chain_and_entrypoint() {
        let op = sample_op();
        let base = op.hash(ENTRYPOINT, SEPOLIA);

        assert_ne!(base, op.hash(ENTRYPOINT, SEPOLIA + 1));
        assert_ne!(
            base,
            op.hash(address!("0x0000000071727De22E5E9d8BAf0edAc6f37da032"), SEPOLIA)
        );
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = sample_op().hash(ENTRYPOINT, SEPOLIA);
        let variants = [
            UserOperation {
                sender: address!("0x9406Cc6185a346906296840746125a0E44976455"),
                ..sample_op()
            },
            UserOperation {
                nonce: U256::from(8),
                ..sample_op()
            },
            sample_op().with_init_code(bytes!("01")),
            UserOperation {
                call_data: bytes!("b61d27f7"),
                ..sample_op()
            },
            UserOperation {
                call_gas_limit: U256::from(21_001),
                ..sample_op()
            },
            UserOperation {
                verification_gas_limit: U256::from(100_001),
                ..sample_op()
            },
            UserOperation {
                pre_verification_gas: U256::from(50_001),
                ..sample_op()
            },
            UserOperation {
                max_fee_per_gas: U256::from(2_000_000_001u64),
                ..sample_op()
            },
            UserOperation {
                max_priority_fee_per_gas: U256::from(1_000_000_001u64),
                ..sample_op()
            },
            UserOperation {
                paymaster_and_data: bytes!("aa"),
                ..sample_op()
            },
        ];

        for variant in variants {
            assert_ne!(variant.hash(ENTRYPOINT, SEPOLIA), base, "{variant:?}");
        }
    }

    #[test]
    fn test_signature_does_not_change_hash() {
        let op = sample_op();
        let digest = op.hash(ENTRYPOINT, SEPOLIA);

        let signed = op.into_signed(Bytes::from(vec![0x11; 65]));
        assert_eq!(signed.operation.hash(ENTRYPOINT, SEPOLIA), digest);

        let resigned = signed.operation.into_signed(Bytes::from(vec![0x22; 65]));
        assert_eq!(resigned.operation.hash(ENTRYPOINT, SEPOLIA), digest);
    }

    #[test]
    fn test_unsigned_operation_wire_format() {
        let value = serde_json::to_value(sample_op()).unwrap();

        assert_eq!(
            value,
            json!({
                "sender": "0x9406Cc6185a346906296840746125a0E44976454",
                "nonce": "0x7",
                "initCode": "0x",
                "callData": "0xb61d27f6",
                "callGasLimit": "0x5208",
                "verificationGasLimit": "0x186a0",
                "preVerificationGas": "0xc350",
                "maxFeePerGas": "0x77359400",
                "maxPriorityFeePerGas": "0x3b9aca00",
                "paymasterAndData": "0x"
            })
        );
        assert!(value.get("signature").is_none());
    }

    #[test]
    fn test_signed_operation_round_trips_through_json() {
        let signed = sample_op().into_signed(bytes!("abcd"));
        let json = serde_json::to_string(&signed).unwrap();
        assert!(json.contains(r#""signature":"0xabcd""#));

        let parsed: SignedUserOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, signed);
    }

    #[test]
    fn test_with_quote_copies_every_field() {
        let quote = GasAndPaymasterQuote {
            pre_verification_gas: U256::from(1),
            call_gas_limit: U256::from(2),
            verification_gas_limit: U256::from(3),
            paymaster_and_data: bytes!("beef"),
            max_fee_per_gas: U256::from(4),
            max_priority_fee_per_gas: U256::from(5),
        };

        let op = UserOperation::new(Address::ZERO, U256::ZERO, Bytes::new()).with_quote(&quote);
        assert_eq!(op.pre_verification_gas, U256::from(1));
        assert_eq!(op.call_gas_limit, U256::from(2));
        assert_eq!(op.verification_gas_limit, U256::from(3));
        assert_eq!(op.paymaster_and_data, bytes!("beef"));
        assert_eq!(op.max_fee_per_gas, U256::from(4));
        assert_eq!(op.max_priority_fee_per_gas, U256::from(5));
    }
}
