//! Renders a merged publish into a Slack message.
//!
//! Formatting runs in two stages. A resolution stage first replaces variant
//! tokens with human labels via the item-lookup collaborator; lookups run
//! concurrently but all settle before anything is rendered, so a message is
//! never flushed half-resolved. The rendering stage then assembles the
//! header plus at most one section per category, dropping empty sub-lines
//! and empty sections.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::event::{LibraryItem, MergedPublish};
use crate::lookup::ItemLookup;

/// Marker character identifying an internal variant token rather than a
/// human label.
const VARIANT_MARKER: char = '=';

/// Outbound `chat.postMessage` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub channel: String,
    /// Plain-text fallback summary
    pub text: String,
    pub blocks: Vec<Block>,
}

/// One mrkdwn section block.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: &'static str,
    pub text: MrkdwnText,
}

#[derive(Debug, Clone, Serialize)]
pub struct MrkdwnText {
    #[serde(rename = "type")]
    pub text_type: &'static str,
    pub text: String,
}

impl Block {
    fn section(text: String) -> Self {
        Self {
            block_type: "section",
            text: MrkdwnText {
                text_type: "mrkdwn",
                text,
            },
        }
    }
}

/// Builds chat messages for merged publishes.
pub struct MessageFormatter {
    channel: String,
    lookup: Arc<dyn ItemLookup>,
}

impl MessageFormatter {
    pub fn new(channel: impl Into<String>, lookup: Arc<dyn ItemLookup>) -> Self {
        Self {
            channel: channel.into(),
            lookup,
        }
    }

    /// Render one merged publish into a message for the configured channel.
    pub async fn format(&self, publish: MergedPublish) -> ChatMessage {
        let MergedPublish {
            identity,
            file_name,
            actor,
            description,
            created_components,
            modified_components,
            deleted_components,
            created_styles,
            modified_styles,
            deleted_styles,
        } = publish;

        let (
            created_components,
            modified_components,
            deleted_components,
            created_styles,
            modified_styles,
            deleted_styles,
        ) = tokio::join!(
            self.resolve_list(created_components),
            self.resolve_list(modified_components),
            self.resolve_list(deleted_components),
            self.resolve_list(created_styles),
            self.resolve_list(modified_styles),
            self.resolve_list(deleted_styles),
        );

        let header = format!(
            "Changes to Figma library <https://www.figma.com/file/{}/Filename|{}> published by {}.",
            identity.file_key, file_name, actor
        );
        let header = match description.filter(|d| !d.is_empty()) {
            Some(description) => format!("{header}\n>{description}"),
            None => header,
        };

        let mut blocks = vec![Block::section(header)];
        blocks.extend(category_section(
            "Components",
            &created_components,
            &modified_components,
            &deleted_components,
        ));
        blocks.extend(category_section(
            "Styles",
            &created_styles,
            &modified_styles,
            &deleted_styles,
        ));

        ChatMessage {
            channel: self.channel.clone(),
            text: format!("Changes published to Figma library {file_name}"),
            blocks,
        }
    }

    /// Resolve every variant token in one list, concurrently, keeping order.
    async fn resolve_list(&self, items: Vec<LibraryItem>) -> Vec<LibraryItem> {
        join_all(items.into_iter().map(|item| self.resolve_item(item)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Pass plain-named items through; resolve variant tokens to the name of
    /// the containing frame. An unresolvable item is dropped rather than
    /// rendered with a blank name.
    async fn resolve_item(&self, item: LibraryItem) -> Option<LibraryItem> {
        if !item.name.contains(VARIANT_MARKER) {
            return Some(item);
        }

        match self.lookup.fetch_item(&item.key).await {
            Ok(details) => match details
                .containing_group_name
                .filter(|name| !name.is_empty())
            {
                Some(name) => Some(LibraryItem { name, key: item.key }),
                None => {
                    warn!(key = %item.key, "Lookup returned no containing frame name, dropping item");
                    None
                }
            },
            Err(error) => {
                warn!(key = %item.key, error = %error, "Item lookup failed, dropping item");
                None
            }
        }
    }
}

/// One `*Heading*` section with Added/Modified/Removed lines, or `None` when
/// all three lists render empty.
fn category_section(
    heading: &str,
    created: &[LibraryItem],
    modified: &[LibraryItem],
    deleted: &[LibraryItem],
) -> Option<Block> {
    let lines: Vec<String> = [
        ("Added", created),
        ("Modified", modified),
        ("Removed", deleted),
    ]
    .into_iter()
    .filter_map(|(label, items)| name_line(label, items))
    .collect();

    if lines.is_empty() {
        return None;
    }
    Some(Block::section(format!("*{heading}*\n{}", lines.join("\n"))))
}

/// `Label: a, b, c` over unique non-empty names, or `None` when nothing is
/// left to show.
fn name_line(label: &str, items: &[LibraryItem]) -> Option<String> {
    let mut names: Vec<&str> = Vec::new();
    for item in items {
        let name = item.name.as_str();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }

    if names.is_empty() {
        return None;
    }
    Some(format!("{label}: {}", names.join(", ")))
}
