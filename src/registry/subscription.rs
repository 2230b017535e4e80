//! Subscriber queues
//!
//! Each subscriber gets its own bounded queue. The registry keeps the sending
//! half; the consumer holds a [`Subscription`]. There is no unsubscribe call:
//! consumers stop reading or drop their `Subscription`, and every queue of a
//! source is closed when the source is removed.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::source::SourceId;

use super::frame::Frame;

/// Sending half of a subscriber queue, held in the registry
#[derive(Debug, Clone)]
pub(crate) struct Subscriber {
    tx: mpsc::Sender<Frame>,
}

/// Result of offering a frame to one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    /// Queue full, the subscriber misses this frame
    Full,
    /// Consumer dropped its subscription
    Gone,
}

impl Subscriber {
    /// Offer a frame without waiting
    pub(crate) fn offer(&self, frame: Frame) -> Delivery {
        match self.tx.try_send(frame) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Gone,
        }
    }

    pub(crate) fn is_gone(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end of a subscription to one source
///
/// Yields frames in sequence order. Frames may be missing when the consumer
/// falls behind by more than the queue capacity.
#[derive(Debug)]
pub struct Subscription {
    source_id: SourceId,
    rx: mpsc::Receiver<Frame>,
}

impl Subscription {
    /// Allocate a bounded queue for `source_id`
    pub(crate) fn channel(source_id: SourceId, capacity: usize) -> (Subscriber, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Subscriber { tx }, Subscription { source_id, rx })
    }

    /// Source this subscription receives from
    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Wait for the next frame
    ///
    /// Returns `None` once the source was removed and every buffered frame
    /// has been read.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Take a buffered frame without waiting
    pub fn try_recv(&mut self) -> Result<Frame, TryRecvError> {
        self.rx.try_recv()
    }

    /// Give up the wrapper and use the channel directly
    pub fn into_inner(self) -> mpsc::Receiver<Frame> {
        self.rx
    }
}
