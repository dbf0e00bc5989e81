use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{Cli, CommandContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::get_config()?;

    let subscriber = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level if RUST_LOG environment variable is not set
            "alchemy_userop_cli=info,alchemy_aa_core=info,alchemy_core=info".into()
        }),
    );

    // Logs go to stderr; stdout carries command output
    match config.log_format {
        config::LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        config::LogFormat::Pretty => subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    tracing::debug!(
        chain_id = config.alchemy.chain_id,
        entrypoint = %config.account.entrypoint,
        "Configuration loaded"
    );

    let ctx = CommandContext::new(config)?;
    commands::run(cli, ctx).await
}
