//! Source lifecycle controller
//!
//! Owns one source's producer from backend open to teardown. The registry
//! drives it in three steps:
//!
//! 1. [`SourceController::new`] allocates the handle (`Created → Starting`)
//! 2. [`SourceController::open`] opens the backend off the async threads and
//!    allocates the output channel (`Starting → Active`); nothing runs yet
//! 3. [`SourceController::start`] spawns the producer loop
//!
//! [`SourceController::stop`] may be called at any point afterwards and is
//! idempotent. A controller that is opened but never started releases its
//! backend when stopped or dropped.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::capture::{BackendError, BackendFactory};
use crate::encode::FrameEncoder;
use crate::registry::Frame;
use crate::source::{SourceConfig, SourceId};
use crate::stats::SourceCounters;

use super::producer::{Producer, ShutdownGuard, StopReason};
use super::state::{LifecycleState, SourcePhase};

/// Runtime handle for one source
pub struct SourceController {
    id: SourceId,
    config: SourceConfig,
    state: Arc<LifecycleState>,
    guard: Arc<ShutdownGuard>,
    cancel: CancellationToken,
    counters: Arc<SourceCounters>,
    /// Opened but not yet started; behind a mutex only so the controller is
    /// `Sync` while the backend is not
    pending: Mutex<Option<Producer>>,
    task: Option<JoinHandle<StopReason>>,
}

impl SourceController {
    /// Create a controller stopped only through this handle
    pub fn new(config: SourceConfig, counters: Arc<SourceCounters>) -> Self {
        Self::with_cancel(config, counters, CancellationToken::new())
    }

    /// Create a controller that also stops when `parent` is cancelled
    pub fn with_parent(
        config: SourceConfig,
        counters: Arc<SourceCounters>,
        parent: &CancellationToken,
    ) -> Self {
        Self::with_cancel(config, counters, parent.child_token())
    }

    fn with_cancel(
        config: SourceConfig,
        counters: Arc<SourceCounters>,
        cancel: CancellationToken,
    ) -> Self {
        let state = Arc::new(LifecycleState::new());
        state.begin_start();

        Self {
            id: config.id(),
            config,
            state,
            guard: Arc::new(ShutdownGuard::new()),
            cancel,
            counters,
            pending: Mutex::new(None),
            task: None,
        }
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn phase(&self) -> SourcePhase {
        self.state.phase()
    }

    /// Whether frames are currently being captured
    pub fn is_streaming(&self) -> bool {
        self.state.is_active()
    }

    /// Whether the output channel is closed and the backend released
    pub fn is_torn_down(&self) -> bool {
        self.guard.has_fired()
    }

    /// Token cancelled when this source stops
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Open the capture backend and allocate the output channel
    ///
    /// Returns the receiving end of the output channel. On failure the source
    /// is closed and nothing was started.
    ///
    /// If the controller is cancelled or dropped while the backend is still
    /// opening, the backend is closed as soon as the open returns.
    pub async fn open(
        &mut self,
        factory: Arc<dyn BackendFactory>,
        encoder: Arc<dyn FrameEncoder>,
        output_capacity: usize,
    ) -> Result<mpsc::Receiver<Frame>, BackendError> {
        let config = self.config.clone();
        let cancel = self.cancel.clone();
        let opened = tokio::task::spawn_blocking(move || {
            let mut backend = factory.open(&config)?;
            if cancel.is_cancelled() {
                backend.close();
                tracing::debug!(uri = %config.uri, "Backend opened after cancellation, closed");
                return Err(BackendError::Open("cancelled while opening".into()));
            }
            Ok(backend)
        })
        .await
            .map_err(|e| BackendError::Open(format!("backend open task failed: {}", e)))
            .and_then(|result| result);

        let backend = match opened {
            Ok(backend) => backend,
            Err(e) => {
                self.guard.fire();
                self.state.mark_closed();
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::channel(output_capacity.max(1));

        let producer = Producer {
            id: self.id.clone(),
            kind: self.config.kind,
            backend: Some(backend),
            encoder,
            output: Some(tx),
            state: Arc::clone(&self.state),
            guard: Arc::clone(&self.guard),
            cancel: self.cancel.clone(),
            counters: Arc::clone(&self.counters),
            sequence: 0,
        };
        *self.pending_mut() = Some(producer);

        self.state.mark_active();
        Ok(rx)
    }

    /// Spawn the producer loop
    ///
    /// Does nothing unless the backend was opened.
    pub fn start(&mut self) {
        let Some(producer) = self.pending_mut().take() else {
            return;
        };

        self.task = Some(tokio::task::spawn_blocking(move || producer.run()));
    }

    /// Signal the producer to stop without waiting
    pub fn cancel(&self) {
        self.state.begin_stop();
        self.cancel.cancel();
    }

    /// Stop the producer and wait for teardown
    ///
    /// The producer only checks for cancellation between backend reads, so
    /// this waits for any read in flight to return.
    pub async fn stop(&mut self) {
        self.cancel();

        if let Some(mut producer) = self.pending_mut().take() {
            producer.shutdown();
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(reason) => {
                    tracing::debug!(source = %self.id, reason = ?reason, "Producer joined");
                }
                Err(e) => {
                    tracing::error!(source = %self.id, error = %e, "Producer task failed");
                }
            }
        }

        self.state.mark_closed();
    }

    fn pending_mut(&mut self) -> &mut Option<Producer> {
        self.pending.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SourceController {
    fn drop(&mut self) {
        // A detached producer notices the token on its next iteration
        self.cancel();
    }
}
