//! Figma library publish → Slack relay.
//!
//! Receives library-publish webhooks, coalesces bursts of near-duplicate
//! deliveries inside a fixed quiet period, merges them per
//! `(file_key, timestamp)` identity, and posts at most one formatted message
//! per identity to a fixed Slack channel. State is in-memory and
//! best-effort; the process is meant to be cheap to restart.

pub mod coalescer;
pub mod config;
pub mod event;
pub mod formatter;
pub mod ingest;
pub mod ledger;
pub mod lookup;
pub mod server;
pub mod slack;

pub use coalescer::{Coalescer, DEFAULT_QUIET_PERIOD};
pub use config::RelayConfig;
pub use event::{EventKind, LibraryItem, MergedPublish, PublishIdentity, RawEvent, TriggeredBy};
pub use formatter::{Block, ChatMessage, MessageFormatter, MrkdwnText};
pub use ingest::{Accepted, Ingest, IngestError};
pub use ledger::DeliveredLedger;
pub use lookup::{FigmaLookup, FigmaLookupConfig, ItemDetails, ItemLookup, LookupError};
pub use slack::{ChatDelivery, DeliveryError, SlackClient, SlackClientConfig};
