//! Inbound HTTP surface: webhook intake and health probes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::ingest::{Accepted, Ingest, IngestError};

pub fn build_router(ingest: Arc<Ingest>) -> Router {
    Router::new()
        .route("/", post(handle_webhook))
        .route("/isalive", get(handle_probe))
        .route("/isready", get(handle_probe))
        .with_state(ingest)
}

/// Liveness and readiness probes succeed unconditionally; the relay has no
/// internal state worth gating on.
async fn handle_probe() -> StatusCode {
    StatusCode::OK
}

/// Every rejection path sets its status explicitly; nothing here can crash
/// the process.
async fn handle_webhook(State(ingest): State<Arc<Ingest>>, body: Bytes) -> StatusCode {
    match ingest.accept(&body).await {
        Ok(Accepted::Buffered) | Ok(Accepted::Ignored) => StatusCode::OK,
        Err(IngestError::Unauthorized) => {
            warn!("Rejected webhook with bad passcode");
            StatusCode::UNAUTHORIZED
        }
        Err(error @ IngestError::MalformedPayload(_)) => {
            warn!(error = %error, "Rejected malformed webhook payload");
            StatusCode::BAD_REQUEST
        }
    }
}

/// Bind and serve until ctrl-c. A bind failure is the only fatal startup
/// error in the relay.
pub async fn run(port: u16, ingest: Arc<Ingest>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind webhook listener on {addr}"))?;

    info!(addr = %addr, "Webhook relay listening");

    axum::serve(listener, build_router(ingest))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook server exited unexpectedly")?;

    Ok(())
}
