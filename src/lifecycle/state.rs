//! Source lifecycle state machine
//!
//! `Created → Starting → Active → Stopping → Closed`. The state is shared
//! between the controller, the producer thread and registry snapshots, so it
//! lives in an atomic and every transition is a compare-and-swap. Transitions
//! only move forward.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SourcePhase {
    /// Handle allocated, nothing opened yet
    Created = 0,
    /// Backend being opened
    Starting = 1,
    /// Producer loop running
    Active = 2,
    /// Stop requested or read failed; teardown pending
    Stopping = 3,
    /// Output channel closed and backend released
    Closed = 4,
}

impl SourcePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SourcePhase::Created,
            1 => SourcePhase::Starting,
            2 => SourcePhase::Active,
            3 => SourcePhase::Stopping,
            _ => SourcePhase::Closed,
        }
    }
}

/// Atomic holder for a [`SourcePhase`]
#[derive(Debug)]
pub struct LifecycleState {
    phase: AtomicU8,
}

impl LifecycleState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(SourcePhase::Created as u8),
        }
    }

    pub fn phase(&self) -> SourcePhase {
        SourcePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Whether the producer is delivering frames
    pub fn is_active(&self) -> bool {
        self.phase() == SourcePhase::Active
    }

    fn transition(&self, from: SourcePhase, to: SourcePhase) -> bool {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Created → Starting
    pub fn begin_start(&self) -> bool {
        self.transition(SourcePhase::Created, SourcePhase::Starting)
    }

    /// Starting → Active
    pub fn mark_active(&self) -> bool {
        self.transition(SourcePhase::Starting, SourcePhase::Active)
    }

    /// Any earlier phase → Stopping
    ///
    /// Returns false when the source is already stopping or closed.
    pub fn begin_stop(&self) -> bool {
        let mut current = self.phase.load(Ordering::Acquire);
        loop {
            if current >= SourcePhase::Stopping as u8 {
                return false;
            }
            match self.phase.compare_exchange(
                current,
                SourcePhase::Stopping as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Move to Closed, from any phase
    pub fn mark_closed(&self) {
        self.phase.store(SourcePhase::Closed as u8, Ordering::Release);
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}
