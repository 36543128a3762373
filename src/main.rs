//! Figma publish relay CLI.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use figma_publish_relay::{
    server, Coalescer, FigmaLookup, FigmaLookupConfig, Ingest, MessageFormatter, RelayConfig,
    SlackClient, SlackClientConfig,
};

#[derive(Parser)]
#[command(name = "fpr")]
#[command(about = "Relay Figma library publish webhooks to Slack")]
#[command(version)]
struct Cli {
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Coalescing window in seconds (overrides COALESCE_WINDOW_SECS)
    #[arg(long)]
    window_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log level via RUST_LOG, defaulting to info.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("figma_publish_relay=info,fpr=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(secs) = cli.window_secs {
        config.quiet_period = Duration::from_secs(secs);
    }

    let lookup = Arc::new(FigmaLookup::new(FigmaLookupConfig {
        api_token: config.figma_token.clone(),
        ..Default::default()
    })?);
    let delivery = Arc::new(SlackClient::new(SlackClientConfig {
        bot_token: config.slack_bot_token.clone(),
        ..Default::default()
    })?);

    let formatter = MessageFormatter::new(config.channel.clone(), lookup);
    let coalescer = Coalescer::new(config.quiet_period, formatter, delivery);
    let ingest = Arc::new(Ingest::new(config.webhook_passcode.clone(), coalescer));

    info!(
        channel = %config.channel,
        window_secs = config.quiet_period.as_secs(),
        "Starting Figma publish relay"
    );
    server::run(config.port, ingest).await
}
