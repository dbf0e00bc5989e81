use std::{env, str::FromStr};

use alchemy_aa_core::{account_factory::FactoryCall, userop::DummySignature};
use alchemy_core::constants::{ALCHEMY_SEPOLIA_BASE_URL, ENTRYPOINT_ADDRESS_V0_6};
use alloy::primitives::{Address, ChainId, U256};
use anyhow::Context;
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    pub alchemy: AlchemyConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub receipt: ReceiptPollConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlchemyConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub policy_id: String,
    pub chain_id: ChainId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub entrypoint: Address,
    /// Zero when the account is already deployed
    pub factory_address: Address,
    pub create_account_signature: String,
    /// Decimal or `0x` hex
    pub salt: String,
    pub dummy_signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReceiptPollConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_base_url() -> String {
    ALCHEMY_SEPOLIA_BASE_URL.to_string()
}

impl Default for AccountConfig {
    fn default() -> Self {
        let call = FactoryCall::default();
        Self {
            entrypoint: ENTRYPOINT_ADDRESS_V0_6,
            factory_address: Address::ZERO,
            create_account_signature: call.signature,
            salt: "0".into(),
            dummy_signature: None,
        }
    }
}

impl Default for ReceiptPollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_attempts: 30,
        }
    }
}

impl AccountConfig {
    pub fn factory_call(&self) -> anyhow::Result<FactoryCall> {
        let salt = U256::from_str(self.salt.trim())
            .with_context(|| format!("Invalid factory salt {:?}", self.salt))?;

        Ok(FactoryCall {
            signature: self.create_account_signature.clone(),
            salt,
        })
    }

    pub fn dummy_signature(&self) -> anyhow::Result<DummySignature> {
        match &self.dummy_signature {
            Some(signature) => Ok(DummySignature::from_hex(signature)?),
            None => Ok(DummySignature::default()),
        }
    }
}

pub fn get_config() -> anyhow::Result<CliConfig> {
    let base_path = env::current_dir().context("Failed to determine the current directory")?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment
    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let environment_filename = format!("cli_{}.yaml", environment.as_str());

    let config = Config::builder()
        .add_source(File::from(configuration_directory.join("cli_base.yaml")))
        .add_source(File::from(configuration_directory.join(environment_filename)).required(false))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()
        .context("Failed to build configuration")?;

    config.try_deserialize::<CliConfig>().context(
        "Failed to deserialize configuration; make sure all required fields are set in the \
         configuration files or environment variables",
    )
}

/// The possible runtime environment for the CLI.
pub enum Environment {
    Local,
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local`, `development`, or `production`."
            )),
        }
    }
}
