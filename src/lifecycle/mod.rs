//! Per-source producer lifecycle
//!
//! Each registered source owns one producer running on the blocking thread
//! pool. The producer drives the capture backend, encodes frames and offers
//! them to a bounded output channel, dropping frames when the channel is full.
//!
//! Cancellation is cooperative: the producer checks its token once per
//! iteration, between backend reads. A read that blocks is not interrupted,
//! so shutdown latency is bounded by the backend's own read timeout.
//!
//! Teardown (closing the output channel and releasing the backend) happens
//! exactly once, whichever of explicit stop, cancellation or read failure
//! ends the loop.

pub mod controller;
pub mod producer;
pub mod state;

pub use controller::SourceController;
pub use producer::{ShutdownGuard, StopReason};
pub use state::{LifecycleState, SourcePhase};
