//! Delivered-publish ledger.
//!
//! Tracks which merged publishes have already gone out so that the same
//! identity flushed by two different windows is never delivered twice.
//! Never pruned; bounded by process lifetime, which is fine for short-lived
//! relay infrastructure.

use std::collections::HashSet;

use crate::event::PublishIdentity;

#[derive(Debug, Default)]
pub struct DeliveredLedger {
    delivered: HashSet<PublishIdentity>,
}

impl DeliveredLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-mark in one step: returns `true` exactly once per identity.
    ///
    /// Callers must mark before starting the (possibly slow) formatting and
    /// delivery work, so overlapping flushes cannot both win.
    pub fn check_and_mark(&mut self, identity: &PublishIdentity) -> bool {
        self.delivered.insert(identity.clone())
    }

    /// Number of identities delivered so far.
    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}
