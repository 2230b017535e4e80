//! Producer loop
//!
//! Runs on the blocking thread pool: pulls raw frames from the capture
//! backend, encodes them and offers them to the output channel without ever
//! waiting for room.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureBackend;
use crate::encode::FrameEncoder;
use crate::registry::Frame;
use crate::source::{SourceId, SourceKind};
use crate::stats::SourceCounters;

use super::state::LifecycleState;

/// Log a delivery line every this many frames
const LOG_EVERY_FRAMES: u64 = 30;

/// One-shot teardown latch
///
/// Shared between the producer and its controller so either side can tell
/// whether teardown already happened.
#[derive(Debug, Default)]
pub struct ShutdownGuard {
    fired: AtomicBool,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Why the producer loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Cancellation token fired or a stop was requested
    Cancelled,
    /// Backend read failed and the source cannot loop
    ReadFailed,
    /// The distributor went away
    OutputClosed,
}

/// State owned by the producer thread
pub(crate) struct Producer {
    pub(super) id: SourceId,
    pub(super) kind: SourceKind,
    pub(super) backend: Option<Box<dyn CaptureBackend>>,
    pub(super) encoder: Arc<dyn FrameEncoder>,
    pub(super) output: Option<mpsc::Sender<Frame>>,
    pub(super) state: Arc<LifecycleState>,
    pub(super) guard: Arc<ShutdownGuard>,
    pub(super) cancel: CancellationToken,
    pub(super) counters: Arc<SourceCounters>,
    pub(super) sequence: u64,
}

impl Producer {
    /// Run until cancelled or the source fails, then tear down
    pub(crate) fn run(mut self) -> StopReason {
        tracing::info!(source = %self.id, "Starting frame capture");

        let reason = self.capture_loop();

        self.state.begin_stop();
        self.shutdown();

        tracing::info!(
            source = %self.id,
            reason = ?reason,
            frames = self.sequence,
            "Frame capture stopped"
        );
        reason
    }

    fn capture_loop(&mut self) -> StopReason {
        // Frames read since the last rewind; a file that fails straight after
        // a rewind would otherwise spin forever
        let mut since_rewind: Option<u64> = None;

        loop {
            if self.cancel.is_cancelled() || !self.state.is_active() {
                tracing::debug!(source = %self.id, "Cancellation observed");
                return StopReason::Cancelled;
            }

            let Some(backend) = self.backend.as_mut() else {
                return StopReason::Cancelled;
            };

            let raw = match backend.read_frame() {
                Ok(raw) => {
                    if let Some(count) = since_rewind.as_mut() {
                        *count += 1;
                    }
                    raw
                }
                Err(e) if self.kind.loops_on_read_failure() => {
                    if since_rewind == Some(0) {
                        tracing::warn!(
                            source = %self.id,
                            error = %e,
                            "File yields no frames after rewind, stopping source"
                        );
                        return StopReason::ReadFailed;
                    }

                    tracing::debug!(source = %self.id, error = %e, "Rewinding file source");
                    if let Err(seek_err) = backend.seek_to_start() {
                        tracing::warn!(
                            source = %self.id,
                            error = %seek_err,
                            "Rewind failed, stopping source"
                        );
                        return StopReason::ReadFailed;
                    }
                    self.counters.record_loop_restart();
                    since_rewind = Some(0);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        source = %self.id,
                        error = %e,
                        "Failed to read from source, stopping"
                    );
                    return StopReason::ReadFailed;
                }
            };

            if raw.is_empty() {
                self.counters.record_empty_frame();
                tracing::trace!(source = %self.id, "Discarding empty frame");
                continue;
            }

            let payload = match self.encoder.encode(&raw) {
                Ok(payload) => payload,
                Err(e) => {
                    self.counters.record_encode_failure();
                    tracing::warn!(source = %self.id, error = %e, "Skipping frame");
                    continue;
                }
            };

            let Some(output) = self.output.as_ref() else {
                return StopReason::OutputClosed;
            };

            let sequence = self.sequence;
            self.sequence += 1;
            let size = payload.len();
            self.counters.record_produced(size);

            match output.try_send(Frame::new(self.id.clone(), sequence, payload)) {
                Ok(()) => {
                    if self.sequence % LOG_EVERY_FRAMES == 0 {
                        tracing::debug!(
                            source = %self.id,
                            sequence = sequence,
                            size = size,
                            "Frame sent"
                        );
                    }
                }
                Err(TrySendError::Full(_)) => {
                    self.counters.record_output_drop();
                    tracing::warn!(
                        source = %self.id,
                        sequence = sequence,
                        "Frame buffer full, dropping frame"
                    );
                }
                Err(TrySendError::Closed(_)) => return StopReason::OutputClosed,
            }
        }
    }

    /// Close the output channel and release the backend, exactly once
    pub(crate) fn shutdown(&mut self) {
        if !self.guard.fire() {
            return;
        }

        self.output.take();
        if let Some(mut backend) = self.backend.take() {
            backend.close();
        }
        self.state.mark_closed();

        tracing::debug!(source = %self.id, "Source resources released");
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
