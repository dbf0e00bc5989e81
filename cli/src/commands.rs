use std::{path::PathBuf, time::Duration};

use alchemy_aa_core::{
    account_factory::FactoryCall,
    userop::{
        PendingUserOperation, QuoteRequestConfig, UserOpRequestBuilder, UserOpRequestConfig,
        build_quote_request, finalize_signed,
    },
};
use alchemy_aa_types::GasAndPaymasterQuote;
use alchemy_core::{
    rpc_clients::{AlchemyClient, HttpTransport},
    signer::LocalUserOpSigner,
};
use alloy::primitives::{Address, Bytes, U256};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Build, sign and submit ERC-4337 UserOperations through Alchemy", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request gas limits, fees and paymaster data for an operation
    Quote(OperationArgs),
    /// Quote, sign with a local key and submit
    Send(SendArgs),
    /// Quote and write the operation digest for an external signer
    Prepare(PrepareArgs),
    /// Attach an external signature to a prepared operation and submit
    Finalize(FinalizeArgs),
    /// Fetch the receipt of a submitted operation
    Receipt(ReceiptArgs),
    /// Look up a submitted operation by hash
    Status(HashArgs),
}

#[derive(Debug, Args)]
pub struct OperationArgs {
    /// Smart account sending the operation
    #[arg(long)]
    pub account: Address,
    /// EOA passed to the account factory; defaults to the signer or the account
    #[arg(long)]
    pub owner: Option<Address>,
    #[arg(long, default_value = "0")]
    pub nonce: U256,
    #[arg(long)]
    pub call_data: Bytes,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub operation: OperationArgs,
    #[arg(long, env = "USEROP_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,
    /// Send the operation as the only positional parameter
    #[arg(long)]
    pub without_entrypoint: bool,
}

#[derive(Debug, Args)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub operation: OperationArgs,
    /// Reject signatures that do not recover to this address
    #[arg(long)]
    pub expect_signer: Option<Address>,
    /// Where to write the pending operation, stdout otherwise
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct FinalizeArgs {
    /// File written by `prepare`
    #[arg(long)]
    pub pending: PathBuf,
    /// 65-byte `r || s || v` signature over the pending digest
    #[arg(long)]
    pub signature: Bytes,
}

#[derive(Debug, Args)]
pub struct ReceiptArgs {
    pub hash: String,
    /// Poll until the operation is included
    #[arg(long)]
    pub wait: bool,
}

#[derive(Debug, Args)]
pub struct HashArgs {
    pub hash: String,
}

/// Shared state for one CLI invocation.
pub struct CommandContext {
    config: CliConfig,
    client: AlchemyClient<HttpTransport>,
    next_id: u64,
}

impl CommandContext {
    pub fn new(config: CliConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::alchemy(&config.alchemy.base_url, &config.alchemy.api_key)?;
        Ok(Self {
            config,
            client: AlchemyClient::new(transport),
            next_id: 1,
        })
    }

    fn request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    async fn quote(
        &mut self,
        operation: &OperationArgs,
        owner: Address,
        factory_call: &FactoryCall,
    ) -> anyhow::Result<GasAndPaymasterQuote> {
        let dummy_signature = self.config.account.dummy_signature()?;
        let id = self.request_id();

        let request = build_quote_request(
            QuoteRequestConfig {
                call_data: operation.call_data.clone(),
                owner_address: owner,
                account_address: operation.account,
                nonce: operation.nonce,
                policy_id: &self.config.alchemy.policy_id,
                entrypoint: self.config.account.entrypoint,
                factory_address: self.config.account.factory_address,
                factory_call,
                dummy_signature: &dummy_signature,
            },
            id,
        )?;

        Ok(self.client.request_gas_and_paymaster(request).await?)
    }

    fn request_config<'a>(
        &self,
        operation: &OperationArgs,
        owner: Address,
        quote: &'a GasAndPaymasterQuote,
        factory_call: &'a FactoryCall,
    ) -> UserOpRequestConfig<'a> {
        UserOpRequestConfig {
            call_data: operation.call_data.clone(),
            quote,
            chain_id: self.config.alchemy.chain_id,
            entrypoint: self.config.account.entrypoint,
            owner_address: owner,
            account_address: operation.account,
            nonce: operation.nonce,
            factory_address: self.config.account.factory_address,
            factory_call,
        }
    }
}

pub async fn run(cli: Cli, mut ctx: CommandContext) -> anyhow::Result<()> {
    match cli.command {
        Command::Quote(args) => {
            let factory_call = ctx.config.account.factory_call()?;
            let owner = args.owner.unwrap_or(args.account);
            let quote = ctx.quote(&args, owner, &factory_call).await?;
            print_json(&quote)?;
        }
        Command::Send(args) => {
            let signer = LocalUserOpSigner::from_private_key(&args.private_key)?;
            let factory_call = ctx.config.account.factory_call()?;
            let owner = args.operation.owner.unwrap_or_else(|| signer.address());

            let quote = ctx.quote(&args.operation, owner, &factory_call).await?;
            let id = ctx.request_id();
            let config = ctx.request_config(&args.operation, owner, &quote, &factory_call);
            let request = UserOpRequestBuilder::new(config).build_signed(
                &signer,
                id,
                !args.without_entrypoint,
            )?;

            let op_hash = ctx.client.send_user_operation(request).await?;
            println!("{op_hash}");
        }
        Command::Prepare(args) => {
            let factory_call = ctx.config.account.factory_call()?;
            let owner = args.operation.owner.unwrap_or(args.operation.account);

            let quote = ctx.quote(&args.operation, owner, &factory_call).await?;
            let config = ctx.request_config(&args.operation, owner, &quote, &factory_call);
            let mut pending = UserOpRequestBuilder::new(config).prepare()?;
            if let Some(signer) = args.expect_signer {
                pending = pending.expect_signer(signer);
            }

            tracing::info!(digest = %pending.digest(), "Sign this digest and run `finalize`");

            let serialized = serde_json::to_string_pretty(&pending)?;
            match args.out {
                Some(path) => std::fs::write(&path, serialized)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{serialized}"),
            }
        }
        Command::Finalize(args) => {
            let pending = std::fs::read(&args.pending)
                .with_context(|| format!("Failed to read {}", args.pending.display()))?;
            let pending: PendingUserOperation = serde_json::from_slice(&pending)
                .context("Pending operation file is not valid")?;

            let id = ctx.request_id();
            let request =
                finalize_signed(id, args.signature, pending, ctx.config.account.entrypoint)?;
            let op_hash = ctx.client.send_user_operation(request).await?;
            println!("{op_hash}");
        }
        Command::Receipt(args) => {
            let attempts = if args.wait {
                ctx.config.receipt.max_attempts.max(1)
            } else {
                1
            };
            let interval = Duration::from_millis(ctx.config.receipt.interval_ms);

            for attempt in 1..=attempts {
                let id = ctx.request_id();
                if let Some(receipt) = ctx.client.get_user_operation_receipt(&args.hash, id).await? {
                    print_json(&receipt)?;
                    return Ok(());
                }

                tracing::debug!(attempt, "Receipt not available yet");
                if attempt < attempts {
                    tokio::time::sleep(interval).await;
                }
            }

            anyhow::bail!("No receipt for {} yet", args.hash);
        }
        Command::Status(args) => {
            let id = ctx.request_id();
            match ctx.client.get_user_operation_by_hash(&args.hash, id).await? {
                Some(lookup) => print_json(&lookup)?,
                None => anyhow::bail!("Operation {} is unknown to the bundler", args.hash),
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
