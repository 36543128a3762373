//! Wire types for library publish webhooks and their merged form.
//!
//! The inbound shape follows the Figma webhook payload: a publish carries six
//! item-change lists (created/modified/deleted for components and styles).
//! Bursts of deliveries for the same logical publish share a
//! `(file_key, timestamp)` identity and are folded into one [`MergedPublish`].

use std::fmt;

use serde::Deserialize;

/// One component or style entry in a publish payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryItem {
    /// Display name; variant items carry an internal `prop=value` token
    /// instead of a human label
    #[serde(default)]
    pub name: String,
    /// Stable identifier assigned by the design tool
    #[serde(default)]
    pub key: String,
}

impl LibraryItem {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    /// Identity used when merging lists: the key when present, else the name.
    pub fn identity(&self) -> &str {
        if self.key.is_empty() {
            &self.name
        } else {
            &self.key
        }
    }
}

/// Who triggered the publish.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggeredBy {
    #[serde(default)]
    pub handle: String,
}

/// Webhook event kind. Only library publishes are acted on; everything else
/// is accepted and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EventKind {
    #[serde(rename = "LIBRARY_PUBLISH")]
    LibraryPublish,
    #[serde(other)]
    Other,
}

/// One inbound publish notification, as delivered by the webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub file_key: String,
    pub file_name: String,
    /// Opaque grouping key supplied by the source; not assumed to be a
    /// parseable date
    pub timestamp: String,
    pub event_type: EventKind,
    #[serde(default)]
    pub triggered_by: TriggeredBy,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_components: Vec<LibraryItem>,
    #[serde(default)]
    pub modified_components: Vec<LibraryItem>,
    #[serde(default)]
    pub deleted_components: Vec<LibraryItem>,
    #[serde(default)]
    pub created_styles: Vec<LibraryItem>,
    #[serde(default)]
    pub modified_styles: Vec<LibraryItem>,
    #[serde(default)]
    pub deleted_styles: Vec<LibraryItem>,
}

/// The `(file_key, timestamp)` pair that defines whether two events refer to
/// the same logical publish action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublishIdentity {
    pub file_key: String,
    pub timestamp: String,
}

impl PublishIdentity {
    pub fn of(event: &RawEvent) -> Self {
        Self {
            file_key: event.file_key.clone(),
            timestamp: event.timestamp.clone(),
        }
    }
}

impl fmt::Display for PublishIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.file_key, self.timestamp)
    }
}

/// The deduped union of all events sharing one identity within one window.
///
/// Header fields come from the first event of the group; the six item lists
/// grow as later events are absorbed and never shrink. After the window
/// flushes the value is handed off by move and no longer mutated.
#[derive(Debug, Clone)]
pub struct MergedPublish {
    pub identity: PublishIdentity,
    pub file_name: String,
    pub actor: String,
    pub description: Option<String>,
    pub created_components: Vec<LibraryItem>,
    pub modified_components: Vec<LibraryItem>,
    pub deleted_components: Vec<LibraryItem>,
    pub created_styles: Vec<LibraryItem>,
    pub modified_styles: Vec<LibraryItem>,
    pub deleted_styles: Vec<LibraryItem>,
}

impl MergedPublish {
    /// Start a merged publish from the first event of its group.
    pub fn new(event: RawEvent) -> Self {
        let mut merged = Self {
            identity: PublishIdentity::of(&event),
            file_name: event.file_name.clone(),
            actor: event.triggered_by.handle.clone(),
            description: event.description.clone(),
            created_components: Vec::new(),
            modified_components: Vec::new(),
            deleted_components: Vec::new(),
            created_styles: Vec::new(),
            modified_styles: Vec::new(),
            deleted_styles: Vec::new(),
        };
        merged.absorb(event);
        merged
    }

    /// Union another event's item lists into this publish, deduping by item
    /// identity and preserving first-seen order.
    pub fn absorb(&mut self, event: RawEvent) {
        extend_deduped(&mut self.created_components, event.created_components);
        extend_deduped(&mut self.modified_components, event.modified_components);
        extend_deduped(&mut self.deleted_components, event.deleted_components);
        extend_deduped(&mut self.created_styles, event.created_styles);
        extend_deduped(&mut self.modified_styles, event.modified_styles);
        extend_deduped(&mut self.deleted_styles, event.deleted_styles);
    }
}

fn extend_deduped(target: &mut Vec<LibraryItem>, incoming: Vec<LibraryItem>) {
    for item in incoming {
        if !target
            .iter()
            .any(|existing| existing.identity() == item.identity())
        {
            target.push(item);
        }
    }
}
