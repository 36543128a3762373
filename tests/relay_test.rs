//! End-to-end relay scenarios: ingest through coalescing to delivery,
//! with mock chat and lookup collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use figma_publish_relay::{
    Accepted, ChatDelivery, ChatMessage, Coalescer, DeliveryError, Ingest, IngestError,
    ItemDetails, ItemLookup, LookupError, MessageFormatter,
};

const PASSCODE: &str = "hunter2";
const QUIET: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(150);

/// Chat delivery that records every message it is handed.
#[derive(Default)]
struct RecordingDelivery {
    sent: Mutex<Vec<ChatMessage>>,
}

impl RecordingDelivery {
    async fn sent(&self) -> Vec<ChatMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatDelivery for RecordingDelivery {
    async fn post_message(&self, message: &ChatMessage) -> Result<(), DeliveryError> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Lookup that resolves every key to "ResolvedName".
struct ResolvingLookup;

#[async_trait]
impl ItemLookup for ResolvingLookup {
    async fn fetch_item(&self, _key: &str) -> Result<ItemDetails, LookupError> {
        Ok(ItemDetails {
            containing_group_name: Some("ResolvedName".to_string()),
        })
    }
}

fn relay() -> (Ingest, Arc<Coalescer>, Arc<RecordingDelivery>) {
    let delivery = Arc::new(RecordingDelivery::default());
    let coalescer = Coalescer::new(
        QUIET,
        MessageFormatter::new("design-updates", Arc::new(ResolvingLookup)),
        delivery.clone(),
    );
    (
        Ingest::new(PASSCODE, coalescer.clone()),
        coalescer,
        delivery,
    )
}

fn publish_body(extra: serde_json::Value) -> Vec<u8> {
    let mut body = serde_json::json!({
        "file_key": "F1",
        "file_name": "Design System",
        "timestamp": "T1",
        "event_type": "LIBRARY_PUBLISH",
        "triggered_by": { "handle": "ada" },
        "passcode": PASSCODE,
    });
    body.as_object_mut()
        .unwrap()
        .extend(extra.as_object().unwrap().clone());
    serde_json::to_vec(&body).unwrap()
}

fn section_texts(message: &ChatMessage) -> Vec<String> {
    message
        .blocks
        .iter()
        .map(|block| block.text.text.clone())
        .collect()
}

#[tokio::test]
async fn overlapping_events_merge_into_one_message() {
    let (ingest, _coalescer, delivery) = relay();

    // Given: two events for the same publish, one reporting the creation and
    // one reporting a modification of the same component.
    let a = publish_body(serde_json::json!({
        "created_components": [{ "name": "Btn", "key": "k1" }],
    }));
    let b = publish_body(serde_json::json!({
        "modified_components": [{ "name": "Btn", "key": "k1" }],
    }));

    // When: both arrive within the quiet period.
    assert_eq!(ingest.accept(&a).await.unwrap(), Accepted::Buffered);
    assert_eq!(ingest.accept(&b).await.unwrap(), Accepted::Buffered);
    tokio::time::sleep(SETTLE).await;

    // Then: exactly one message, carrying both change lists.
    let sent = delivery.sent().await;
    assert_eq!(sent.len(), 1);
    let texts = section_texts(&sent[0]);
    assert!(texts
        .iter()
        .any(|text| text.contains("Added: Btn") && text.contains("Modified: Btn")));
}

#[tokio::test]
async fn distinct_identities_produce_distinct_messages() {
    let (ingest, _coalescer, delivery) = relay();

    let a = publish_body(serde_json::json!({ "timestamp": "T1" }));
    let b = publish_body(serde_json::json!({ "timestamp": "T2" }));

    ingest.accept(&a).await.unwrap();
    ingest.accept(&b).await.unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(delivery.sent().await.len(), 2);
}

#[tokio::test]
async fn same_identity_across_two_windows_delivers_once() {
    let (ingest, coalescer, delivery) = relay();
    let body = publish_body(serde_json::json!({}));

    // First window flushes and delivers.
    ingest.accept(&body).await.unwrap();
    tokio::time::sleep(SETTLE).await;
    assert_eq!(delivery.sent().await.len(), 1);

    // Second window for the same identity flushes but delivers nothing.
    ingest.accept(&body).await.unwrap();
    assert!(coalescer.window_open().await);
    tokio::time::sleep(SETTLE).await;
    assert_eq!(delivery.sent().await.len(), 1);
}

#[tokio::test]
async fn variant_token_renders_as_resolved_name() {
    let (ingest, _coalescer, delivery) = relay();

    let body = publish_body(serde_json::json!({
        "created_components": [{ "name": "k1=variant", "key": "k1" }],
    }));
    ingest.accept(&body).await.unwrap();
    tokio::time::sleep(SETTLE).await;

    let sent = delivery.sent().await;
    assert_eq!(sent.len(), 1);
    let texts = section_texts(&sent[0]);
    assert!(texts.iter().any(|text| text.contains("Added: ResolvedName")));
    assert!(!texts.iter().any(|text| text.contains("k1=variant")));
}

#[tokio::test]
async fn ignored_kinds_cause_no_flush_activity() {
    let (ingest, coalescer, delivery) = relay();

    let body = serde_json::to_vec(&serde_json::json!({
        "event_type": "FILE_UPDATE",
        "passcode": PASSCODE,
    }))
    .unwrap();

    assert_eq!(ingest.accept(&body).await.unwrap(), Accepted::Ignored);
    assert_eq!(coalescer.pending_events().await, 0);
    assert!(!coalescer.window_open().await);

    tokio::time::sleep(SETTLE).await;
    assert!(delivery.sent().await.is_empty());
}

#[tokio::test]
async fn wrong_passcode_leaves_relay_untouched() {
    let (ingest, coalescer, delivery) = relay();

    let mut body: serde_json::Value =
        serde_json::from_slice(&publish_body(serde_json::json!({}))).unwrap();
    body["passcode"] = serde_json::json!("wrong");
    let result = ingest.accept(&serde_json::to_vec(&body).unwrap()).await;

    assert!(matches!(result, Err(IngestError::Unauthorized)));
    assert_eq!(coalescer.pending_events().await, 0);
    assert!(!coalescer.window_open().await);

    tokio::time::sleep(SETTLE).await;
    assert!(delivery.sent().await.is_empty());
}

#[tokio::test]
async fn delivered_message_targets_fixed_channel() {
    let (ingest, _coalescer, delivery) = relay();

    ingest
        .accept(&publish_body(serde_json::json!({})))
        .await
        .unwrap();
    tokio::time::sleep(SETTLE).await;

    let sent = delivery.sent().await;
    assert_eq!(sent[0].channel, "design-updates");
    assert_eq!(
        sent[0].text,
        "Changes published to Figma library Design System"
    );
}
