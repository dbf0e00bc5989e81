pub mod codec;
pub mod quote;
pub mod userop;

pub use codec::UserOpError;
pub use quote::GasAndPaymasterQuote;
pub use userop::{SignedUserOperation, UserOperation, compute_user_op_hash};
