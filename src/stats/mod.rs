//! Per-source statistics

pub mod metrics;

pub use metrics::{SourceCounters, SourceStats};
