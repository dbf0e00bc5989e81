use alloy::primitives::{Address, address, hex};

pub const ENTRYPOINT_ADDRESS_V0_6: Address =
    address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

/// Placeholder signature sent with gas estimation requests. Same length as a
/// real ECDSA signature so size-sensitive estimators quote correctly.
pub const DEFAULT_DUMMY_SIGNATURE: [u8; 65] = hex!(
    "fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c"
);

pub const ALCHEMY_SEPOLIA_BASE_URL: &str = "https://eth-sepolia.g.alchemy.com/v2/";

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_REQUEST_GAS_AND_PAYMASTER: &str = "alchemy_requestGasAndPaymasterAndData";
pub const METHOD_SEND_USER_OPERATION: &str = "eth_sendUserOperation";
pub const METHOD_GET_USER_OPERATION_RECEIPT: &str = "eth_getUserOperationReceipt";
pub const METHOD_GET_USER_OPERATION_BY_HASH: &str = "eth_getUserOperationByHash";
