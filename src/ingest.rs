//! Inbound webhook validation and filtering.
//!
//! Accepting a payload is fire-and-forget from the webhook's point of view:
//! a valid publish is buffered and the call returns without waiting for the
//! window to flush or the message to go out.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::coalescer::Coalescer;
use crate::event::{EventKind, RawEvent};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("webhook passcode mismatch")]
    Unauthorized,
}

/// Outcome of accepting a webhook body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// A library publish was buffered for the current window
    Buffered,
    /// The event kind is not acted on; accepted and discarded
    Ignored,
}

/// Passcode and kind checks run against this loose shape first, so that
/// non-publish events (pings and the like) are accepted without requiring
/// the full publish fields.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    passcode: String,
    #[serde(default)]
    event_type: Option<EventKind>,
}

pub struct Ingest {
    passcode: String,
    coalescer: Arc<Coalescer>,
}

impl Ingest {
    pub fn new(passcode: impl Into<String>, coalescer: Arc<Coalescer>) -> Self {
        Self {
            passcode: passcode.into(),
            coalescer,
        }
    }

    /// Validate one webhook body and buffer it if it is a library publish.
    ///
    /// A passcode mismatch rejects immediately, before any parsing of the
    /// event body or buffer mutation. Unknown event kinds are accepted and
    /// dropped; that is filtering, not an error.
    pub async fn accept(&self, body: &[u8]) -> Result<Accepted, IngestError> {
        let envelope: Envelope = serde_json::from_slice(body)?;

        if envelope.passcode != self.passcode {
            return Err(IngestError::Unauthorized);
        }

        if envelope.event_type != Some(EventKind::LibraryPublish) {
            debug!(kind = ?envelope.event_type, "Ignoring non-publish event");
            return Ok(Accepted::Ignored);
        }

        let event: RawEvent = serde_json::from_slice(body)?;
        self.coalescer.submit(event).await;
        Ok(Accepted::Buffered)
    }
}
