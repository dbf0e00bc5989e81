pub mod builder;
pub mod quote;

pub use builder::{
    PendingUserOperation, UserOpRequestBuilder, UserOpRequestConfig, build_signed_send_request,
    finalize_signed, prepare_for_signing,
};
pub use quote::{DummySignature, QuoteRequestConfig, build_quote_request};
