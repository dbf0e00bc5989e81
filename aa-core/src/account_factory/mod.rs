use alchemy_core::error::AlchemyError;
use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::Function,
    primitives::{Address, Bytes, U256},
};

/// `createAccount` entry point of the SimpleAccount / LightAccount factories.
pub const DEFAULT_CREATE_ACCOUNT_SIGNATURE: &str = "createAccount(address owner,uint256 salt)";

/// Factory call used to deploy an account inside `initCode`.
///
/// The function must take `(address owner, uint256 salt)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryCall {
    pub signature: String,
    pub salt: U256,
}

impl Default for FactoryCall {
    fn default() -> Self {
        Self {
            signature: DEFAULT_CREATE_ACCOUNT_SIGNATURE.to_string(),
            salt: U256::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountFactory {
    factory_address: Address,
    create_account: Function,
    salt: U256,
}

impl AccountFactory {
    pub fn new(factory_address: Address, call: &FactoryCall) -> Result<Self, AlchemyError> {
        let create_account = Function::parse(&call.signature).map_err(|e| {
            AlchemyError::validation(format!(
                "Invalid factory function {:?}: {e}",
                call.signature
            ))
        })?;

        let input_types: Vec<_> = create_account
            .inputs
            .iter()
            .map(|param| param.selector_type().into_owned())
            .collect();
        if input_types != ["address", "uint256"] {
            return Err(AlchemyError::validation(format!(
                "Factory function {} must take (address,uint256), takes ({})",
                create_account.name,
                input_types.join(",")
            )));
        }

        Ok(Self {
            factory_address,
            create_account,
            salt: call.salt,
        })
    }

    pub fn factory_address(&self) -> &Address {
        &self.factory_address
    }

    /// ABI-encoded factory call, selector included.
    pub fn init_calldata(&self, owner: Address) -> Result<Vec<u8>, AlchemyError> {
        self.create_account
            .abi_encode_input(&[
                DynSolValue::Address(owner),
                DynSolValue::Uint(self.salt, 256),
            ])
            .map_err(AlchemyError::encoding)
    }

    /// `factory ++ init_calldata`
    pub fn init_code(&self, owner: Address) -> Result<Bytes, AlchemyError> {
        let calldata = self.init_calldata(owner)?;

        let mut init_code = Vec::with_capacity(self.factory_address.len() + calldata.len());
        init_code.extend_from_slice(self.factory_address.as_slice());
        init_code.extend_from_slice(&calldata);
        Ok(Bytes::from(init_code))
    }
}

/// Init code for `owner`'s account, empty when `factory_address` is zero.
///
/// A zero factory means the account is already deployed; the factory call is
/// then never parsed or encoded.
pub fn build_init_code(
    owner: Address,
    factory_address: Address,
    call: &FactoryCall,
) -> Result<Bytes, AlchemyError> {
    if factory_address.is_zero() {
        return Ok(Bytes::new());
    }

    tracing::debug!(factory = %factory_address, "Factory address set, building init code");
    AccountFactory::new(factory_address, call)?.init_code(owner)
}
