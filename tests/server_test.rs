//! HTTP status mapping for the webhook router.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use figma_publish_relay::server::build_router;
use figma_publish_relay::{
    ChatDelivery, ChatMessage, Coalescer, DeliveryError, Ingest, ItemDetails, ItemLookup,
    LookupError, MessageFormatter,
};

struct NullDelivery;

#[async_trait]
impl ChatDelivery for NullDelivery {
    async fn post_message(&self, _message: &ChatMessage) -> Result<(), DeliveryError> {
        Ok(())
    }
}

struct NoLookup;

#[async_trait]
impl ItemLookup for NoLookup {
    async fn fetch_item(&self, _key: &str) -> Result<ItemDetails, LookupError> {
        Ok(ItemDetails::default())
    }
}

fn router() -> axum::Router {
    let coalescer = Coalescer::new(
        Duration::from_secs(60),
        MessageFormatter::new("design-updates", Arc::new(NoLookup)),
        Arc::new(NullDelivery),
    );
    build_router(Arc::new(Ingest::new("hunter2", coalescer)))
}

fn post_root(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn health_probes_return_empty_200() {
    for path in ["/isalive", "/isready"] {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}

#[tokio::test]
async fn valid_publish_returns_empty_200() {
    let response = router()
        .oneshot(post_root(serde_json::json!({
            "file_key": "F1",
            "file_name": "Design System",
            "timestamp": "T1",
            "event_type": "LIBRARY_PUBLISH",
            "triggered_by": { "handle": "ada" },
            "passcode": "hunter2",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn ignored_kind_still_returns_200() {
    let response = router()
        .oneshot(post_root(serde_json::json!({
            "event_type": "PING",
            "passcode": "hunter2",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_passcode_returns_401() {
    let response = router()
        .oneshot(post_root(serde_json::json!({
            "event_type": "LIBRARY_PUBLISH",
            "passcode": "wrong",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let response = router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn publish_missing_required_fields_returns_400() {
    let response = router()
        .oneshot(post_root(serde_json::json!({
            "event_type": "LIBRARY_PUBLISH",
            "passcode": "hunter2",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
