//! Outbound chat delivery via the Slack Web API.
//!
//! Delivery is fire-and-forget at the relay level: errors are surfaced to the
//! caller for logging and the message is dropped, never queued or retried.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::formatter::ChatMessage;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("chat delivery request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat API rejected message: {0}")]
    Api(String),
}

/// Outbound delivery collaborator.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    async fn post_message(&self, message: &ChatMessage) -> Result<(), DeliveryError>;
}

/// Slack Web API client configuration.
#[derive(Debug, Clone)]
pub struct SlackClientConfig {
    /// API base URL (https://slack.com/api in production)
    pub api_url: String,
    /// Bot token used as bearer auth
    pub bot_token: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SlackClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://slack.com/api".to_string(),
            bot_token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// [`ChatDelivery`] backed by `chat.postMessage`.
#[derive(Debug)]
pub struct SlackClient {
    client: Client,
    config: SlackClientConfig,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(config: SlackClientConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            anyhow::bail!("slack bot_token is required");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatDelivery for SlackClient {
    async fn post_message(&self, message: &ChatMessage) -> Result<(), DeliveryError> {
        let url = format!("{}/chat.postMessage", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.bot_token)
            .json(message)
            .send()
            .await?;

        let body: PostMessageResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(DeliveryError::Api(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_client_requires_token() {
        let result = SlackClient::new(SlackClientConfig::default());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bot_token"));
    }

    #[test]
    fn test_post_message_response_parsing() {
        let ok: PostMessageResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(ok.ok);

        let err: PostMessageResponse =
            serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.as_deref(), Some("channel_not_found"));
    }
}
