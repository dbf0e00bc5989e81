pub mod alchemy;
pub mod envelope;
pub mod transport;

pub use alchemy::AlchemyClient;
pub use transport::{HttpTransport, RpcTransport};
