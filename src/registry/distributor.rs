//! Frame distributor
//!
//! One task per source drains the producer's output channel and offers each
//! frame to every current subscriber without waiting. A full queue only costs
//! its own subscriber that frame, so a stalled consumer never holds up the
//! producer or anyone else.
//!
//! The subscriber list is read under the registry's shared lock, but only long
//! enough to clone the snapshot pointer; sends happen after the lock is
//! released.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::source::SourceId;
use crate::stats::SourceCounters;

use super::frame::Frame;
use super::store::SourceMap;
use super::subscription::{Delivery, Subscriber};

/// Outcome of fanning out one frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FanOut {
    pub(crate) sent: u64,
    pub(crate) full: u64,
    pub(crate) gone: u64,
}

/// Offer `frame` to each subscriber once
pub(crate) fn fan_out(subscribers: &[Subscriber], frame: &Frame) -> FanOut {
    let mut outcome = FanOut::default();
    for subscriber in subscribers {
        match subscriber.offer(frame.clone()) {
            Delivery::Sent => outcome.sent += 1,
            Delivery::Full => outcome.full += 1,
            Delivery::Gone => outcome.gone += 1,
        }
    }
    outcome
}

pub(crate) struct Distributor {
    pub(super) id: SourceId,
    pub(super) generation: u64,
    pub(super) output: mpsc::Receiver<Frame>,
    pub(super) sources: Weak<SourceMap>,
    pub(super) cancel: CancellationToken,
    pub(super) counters: Arc<SourceCounters>,
}

impl Distributor {
    pub(super) async fn run(mut self) {
        tracing::debug!(source = %self.id, "Distributor started");

        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => {
                    // Removal unregisters first; anything still registered
                    // was cancelled from outside
                    tracing::debug!(source = %self.id, "Distributor cancelled");
                    self.retire("Source cancelled, retiring").await;
                    return;
                }
                next = self.output.recv() => next,
            };

            let Some(frame) = next else {
                self.retire("Capture ended, retiring source").await;
                return;
            };

            let Some(subscribers) = self.snapshot().await else {
                tracing::debug!(source = %self.id, "Source gone, distributor exiting");
                return;
            };

            let outcome = fan_out(&subscribers, &frame);
            drop(subscribers);

            self.counters.record_distributed(outcome.full);
            if outcome.full > 0 {
                tracing::trace!(
                    source = %self.id,
                    sequence = frame.sequence,
                    delivered = outcome.sent,
                    skipped = outcome.full,
                    "Slow subscribers missed frame"
                );
            }
            if outcome.gone > 0 {
                self.prune().await;
            }
        }
    }

    /// Current subscriber list, or None once this registration is gone
    async fn snapshot(&self) -> Option<Arc<[Subscriber]>> {
        let sources = self.sources.upgrade()?;
        let map = sources.read().await;
        map.get(&self.id)
            .filter(|entry| entry.generation == self.generation)
            .map(|entry| Arc::clone(&entry.subscribers))
    }

    async fn prune(&self) {
        let Some(sources) = self.sources.upgrade() else {
            return;
        };
        let mut map = sources.write().await;
        if let Some(entry) = map
            .get_mut(&self.id)
            .filter(|entry| entry.generation == self.generation)
        {
            let removed = entry.prune();
            if removed > 0 {
                tracing::debug!(
                    source = %self.id,
                    removed = removed,
                    remaining = entry.subscribers.len(),
                    "Pruned abandoned subscribers"
                );
            }
        }
    }

    /// Remove this registration after the producer stopped without a removal
    ///
    /// A concurrent removal may have got there first; then there is nothing
    /// left to do.
    async fn retire(&self, message: &'static str) {
        let Some(sources) = self.sources.upgrade() else {
            return;
        };

        let entry = {
            let mut map = sources.write().await;
            let ours = map
                .get(&self.id)
                .is_some_and(|entry| entry.generation == self.generation);
            if ours {
                map.remove(&self.id)
            } else {
                None
            }
        };

        if let Some(mut entry) = entry {
            tracing::info!(source = %self.id, "{}", message);
            // This task is the distributor; don't wait on ourselves
            entry.distributor.take();
            entry.shutdown().await;
        }
    }
}
