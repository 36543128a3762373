//! Environment-style configuration.
//!
//! Variable names match the reference deployment: `SLACK_BOT_TOKEN`,
//! `FIGMA_WEBHOOK_PASSCODE` and `FIGMA_TOKEN` are required;
//! `SLACK_CHANNEL`, `PORT` and `COALESCE_WINDOW_SECS` are optional.
//! `SLACK_SIGNING_SECRET` may be present in the environment for parity but
//! is not used by the relay.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::coalescer::DEFAULT_QUIET_PERIOD;

pub const DEFAULT_CHANNEL: &str = "designsystemet-figma";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Slack bot token for chat.postMessage
    pub slack_bot_token: String,
    /// Shared secret expected in every webhook payload
    pub webhook_passcode: String,
    /// Figma API token for component lookups
    pub figma_token: String,
    /// Destination channel for all notifications
    pub channel: String,
    /// Webhook listen port
    pub port: u16,
    /// Coalescing quiet period
    pub quiet_period: Duration,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let slack_bot_token = require("SLACK_BOT_TOKEN")?;
        let webhook_passcode = require("FIGMA_WEBHOOK_PASSCODE")?;
        let figma_token = require("FIGMA_TOKEN")?;

        let channel = env::var("SLACK_CHANNEL").unwrap_or_else(|_| DEFAULT_CHANNEL.to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid PORT '{raw}'"))?,
            Err(_) => DEFAULT_PORT,
        };

        let quiet_period = match env::var("COALESCE_WINDOW_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("invalid COALESCE_WINDOW_SECS '{raw}'"))?,
            ),
            Err(_) => DEFAULT_QUIET_PERIOD,
        };

        Ok(Self {
            slack_bot_token,
            webhook_passcode,
            figma_token,
            channel,
            port,
            quiet_period,
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing required environment variable {name}"))
}
