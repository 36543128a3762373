//! Item-name lookup against the Figma components API.
//!
//! Items published as variants carry an internal `prop=value` token instead
//! of a human label; the containing frame's name is the label users know.
//! The API is treated as unreliable and every failure degrades gracefully
//! at the call site.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("component lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("component lookup returned {0}")]
    Status(StatusCode),
}

/// What a lookup can tell us about a published item.
#[derive(Debug, Clone, Default)]
pub struct ItemDetails {
    /// Name of the frame containing the item, when known
    pub containing_group_name: Option<String>,
}

/// Best-effort display-name resolution for items published with variant
/// tokens. Implementations may 404 or error at any time.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn fetch_item(&self, key: &str) -> Result<ItemDetails, LookupError>;
}

/// Figma REST client configuration.
#[derive(Debug, Clone)]
pub struct FigmaLookupConfig {
    /// API base URL (https://api.figma.com in production)
    pub base_url: String,
    /// Personal access token sent as X-Figma-Token
    pub api_token: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FigmaLookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.figma.com".to_string(),
            api_token: String::new(),
            timeout_secs: 10,
        }
    }
}

/// [`ItemLookup`] backed by `GET /v1/components/{key}`.
#[derive(Debug)]
pub struct FigmaLookup {
    client: Client,
    config: FigmaLookupConfig,
}

#[derive(Debug, Deserialize)]
struct ComponentResponse {
    #[serde(default)]
    meta: Option<ComponentMeta>,
}

#[derive(Debug, Deserialize)]
struct ComponentMeta {
    #[serde(default)]
    containing_frame: Option<ContainingFrame>,
}

#[derive(Debug, Deserialize)]
struct ContainingFrame {
    #[serde(default)]
    name: Option<String>,
}

impl FigmaLookup {
    pub fn new(config: FigmaLookupConfig) -> Result<Self> {
        if config.api_token.is_empty() {
            anyhow::bail!("figma api_token is required");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ItemLookup for FigmaLookup {
    async fn fetch_item(&self, key: &str) -> Result<ItemDetails, LookupError> {
        let url = format!("{}/v1/components/{}", self.config.base_url, key);

        let response = self
            .client
            .get(&url)
            .header("X-Figma-Token", &self.config.api_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body: ComponentResponse = response.json().await?;
        Ok(ItemDetails {
            containing_group_name: body
                .meta
                .and_then(|meta| meta.containing_frame)
                .and_then(|frame| frame.name),
        })
    }
}
