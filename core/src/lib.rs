pub mod constants;
pub mod error;
pub mod rpc_clients;
pub mod signer;
