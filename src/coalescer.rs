//! Publish-event coalescing window.
//!
//! The webhook delivers several near-duplicate events for one publish action
//! in a tight burst. Accepted events are buffered for a fixed quiet period,
//! then grouped by `(file_key, timestamp)` identity, merged, and delivered at
//! most once per identity.
//!
//! The window is deliberately non-resetting: the timer is anchored to the
//! first event of a batch and later events never extend it. That bounds
//! worst-case latency to one quiet period, at the cost of occasionally
//! splitting a very slow burst across two windows; the delivered-publish
//! ledger keeps the split from producing a duplicate message.

use std::mem;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::event::{MergedPublish, PublishIdentity, RawEvent};
use crate::formatter::MessageFormatter;
use crate::ledger::DeliveredLedger;
use crate::slack::ChatDelivery;

/// Quiet period after the first event of a batch.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(10);

/// Buffer, window flag, and ledger behind one lock so that snapshot-and-clear
/// is atomic relative to new appends and the ledger mark happens before any
/// delivery work starts.
///
/// `window_active` is the Idle/Windowing state machine: `false` means Idle
/// (no timer, empty buffer expected), `true` means Windowing (exactly one
/// timer outstanding).
#[derive(Debug, Default)]
struct CoalescerState {
    pending: Vec<RawEvent>,
    window_active: bool,
    ledger: DeliveredLedger,
}

pub struct Coalescer {
    state: Mutex<CoalescerState>,
    quiet_period: Duration,
    formatter: MessageFormatter,
    delivery: Arc<dyn ChatDelivery>,
    /// Handle to ourselves for the timer and per-identity delivery tasks.
    weak_self: Weak<Coalescer>,
}

impl Coalescer {
    pub fn new(
        quiet_period: Duration,
        formatter: MessageFormatter,
        delivery: Arc<dyn ChatDelivery>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            state: Mutex::new(CoalescerState::default()),
            quiet_period,
            formatter,
            delivery,
            weak_self: weak_self.clone(),
        })
    }

    /// Buffer one publish event, opening a window if none is active.
    ///
    /// Returns as soon as the event is buffered; flushing happens on the
    /// timer task. An event accepted while a flush is draining the buffer
    /// lands in the next window, never dropped.
    pub async fn submit(&self, event: RawEvent) {
        let mut state = self.state.lock().await;
        state.pending.push(event);

        if !state.window_active {
            state.window_active = true;
            debug!(
                quiet_secs = self.quiet_period.as_secs_f64(),
                "Opening coalescing window"
            );

            if let Some(coalescer) = self.weak_self.upgrade() {
                tokio::spawn(async move {
                    tokio::time::sleep(coalescer.quiet_period).await;
                    coalescer.flush().await;
                });
            }
        }
    }

    /// Number of events waiting for the current window to flush.
    pub async fn pending_events(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Whether a window timer is currently outstanding.
    pub async fn window_open(&self) -> bool {
        self.state.lock().await.window_active
    }

    /// Drain the buffer, merge by identity, and deliver anything not yet in
    /// the ledger. Invoked by the window timer only.
    async fn flush(&self) {
        let to_deliver = {
            let mut state = self.state.lock().await;
            let snapshot = mem::take(&mut state.pending);
            state.window_active = false;

            if snapshot.is_empty() {
                debug!("Window fired with an empty buffer, nothing to flush");
                Vec::new()
            } else {
                debug!(events = snapshot.len(), "Flushing coalescing window");
                let merged = merge_by_identity(snapshot);
                merged
                    .into_iter()
                    .filter(|publish| {
                        let fresh = state.ledger.check_and_mark(&publish.identity);
                        if !fresh {
                            info!(
                                identity = %publish.identity,
                                "Publish already delivered in an earlier window, skipping"
                            );
                        }
                        fresh
                    })
                    .collect()
            }
        };

        // One task per identity: a slow or failing delivery must not hold up
        // its siblings from the same flush.
        for publish in to_deliver {
            let Some(coalescer) = self.weak_self.upgrade() else {
                break;
            };
            tokio::spawn(async move {
                coalescer.deliver(publish).await;
            });
        }
    }

    async fn deliver(&self, publish: MergedPublish) {
        let identity = publish.identity.clone();
        let message = self.formatter.format(publish).await;

        match self.delivery.post_message(&message).await {
            Ok(()) => info!(identity = %identity, "Publish notification delivered"),
            Err(error) => {
                warn!(
                    identity = %identity,
                    error = %error,
                    "Chat delivery failed, dropping message"
                );
            }
        }
    }
}

/// Fold events into one merged publish per identity, preserving the arrival
/// order of both groups and items.
fn merge_by_identity(events: Vec<RawEvent>) -> Vec<MergedPublish> {
    let mut merged: Vec<MergedPublish> = Vec::new();
    for event in events {
        let identity = PublishIdentity::of(&event);
        match merged.iter_mut().find(|publish| publish.identity == identity) {
            Some(publish) => publish.absorb(event),
            None => merged.push(MergedPublish::new(event)),
        }
    }
    merged
}
