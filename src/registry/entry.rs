//! Source entry types
//!
//! This module defines the per-source state stored in the registry.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::SourceController;
use crate::source::{SourceConfig, SourceInfo};
use crate::stats::{SourceCounters, SourceStats};

use super::subscription::Subscriber;

/// Entry for a single source in the registry
pub(crate) struct SourceEntry {
    /// Distinguishes this registration from later ones under the same id
    pub(super) generation: u64,

    /// Producer lifecycle
    pub(super) controller: SourceController,

    /// Current subscribers, replaced wholesale on change so the distributor
    /// can take a snapshot with a pointer clone
    pub(super) subscribers: Arc<[Subscriber]>,

    /// Distributor task
    pub(super) distributor: Option<JoinHandle<()>>,

    pub(super) counters: Arc<SourceCounters>,
}

impl SourceEntry {
    pub(super) fn config(&self) -> &SourceConfig {
        self.controller.config()
    }

    pub(super) fn info(&self) -> SourceInfo {
        let config = self.config();
        SourceInfo {
            id: self.controller.id().clone(),
            kind: config.kind,
            uri: config.uri.clone(),
            is_streaming: self.controller.is_streaming(),
        }
    }

    pub(super) fn stats(&self) -> SourceStats {
        self.counters.snapshot(self.subscribers.len())
    }

    /// Append a subscriber
    pub(super) fn attach(&mut self, subscriber: Subscriber) {
        let mut subscribers = self.subscribers.to_vec();
        subscribers.push(subscriber);
        self.subscribers = subscribers.into();
    }

    /// Drop subscribers whose consumer went away
    ///
    /// Returns the number removed.
    pub(super) fn prune(&mut self) -> usize {
        let before = self.subscribers.len();
        if self.subscribers.iter().any(Subscriber::is_gone) {
            let live: Vec<Subscriber> = self
                .subscribers
                .iter()
                .filter(|s| !s.is_gone())
                .cloned()
                .collect();
            self.subscribers = live.into();
        }
        before - self.subscribers.len()
    }

    /// Stop the producer, wait for the distributor and close every
    /// subscriber queue
    ///
    /// Must be called with the entry already removed from the map and
    /// without holding the registry lock.
    pub(super) async fn shutdown(mut self) {
        self.controller.stop().await;

        if let Some(distributor) = self.distributor.take() {
            if let Err(e) = distributor.await {
                tracing::error!(
                    source = %self.controller.id(),
                    error = %e,
                    "Distributor task failed"
                );
            }
        }

        let id = self.controller.id().clone();
        let closed = self.subscribers.len();
        // Last senders go with the entry; consumers see end of stream
        drop(self);

        tracing::debug!(source = %id, subscribers = closed, "Subscriber queues closed");
    }
}
