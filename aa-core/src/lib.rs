pub mod account_factory;
pub mod userop;
