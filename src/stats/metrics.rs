//! Statistics and metrics for capture sources

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters shared by a source's producer and distributor
#[derive(Debug)]
pub struct SourceCounters {
    started_at: Instant,
    frames_produced: AtomicU64,
    output_drops: AtomicU64,
    encode_failures: AtomicU64,
    empty_frames: AtomicU64,
    loop_restarts: AtomicU64,
    frames_distributed: AtomicU64,
    subscriber_drops: AtomicU64,
    bytes_produced: AtomicU64,
}

impl SourceCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_produced: AtomicU64::new(0),
            output_drops: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            empty_frames: AtomicU64::new(0),
            loop_restarts: AtomicU64::new(0),
            frames_distributed: AtomicU64::new(0),
            subscriber_drops: AtomicU64::new(0),
            bytes_produced: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_produced(&self, bytes: usize) {
        self.frames_produced.fetch_add(1, Ordering::Relaxed);
        self.bytes_produced.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_output_drop(&self) {
        self.output_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_empty_frame(&self) {
        self.empty_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_loop_restart(&self) {
        self.loop_restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_distributed(&self, dropped_by_subscribers: u64) {
        self.frames_distributed.fetch_add(1, Ordering::Relaxed);
        if dropped_by_subscribers > 0 {
            self.subscriber_drops
                .fetch_add(dropped_by_subscribers, Ordering::Relaxed);
        }
    }

    /// Take a point-in-time snapshot
    pub fn snapshot(&self, subscriber_count: usize) -> SourceStats {
        SourceStats {
            uptime: self.started_at.elapsed(),
            frames_produced: self.frames_produced.load(Ordering::Relaxed),
            output_drops: self.output_drops.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            empty_frames: self.empty_frames.load(Ordering::Relaxed),
            loop_restarts: self.loop_restarts.load(Ordering::Relaxed),
            frames_distributed: self.frames_distributed.load(Ordering::Relaxed),
            subscriber_drops: self.subscriber_drops.load(Ordering::Relaxed),
            bytes_produced: self.bytes_produced.load(Ordering::Relaxed),
            subscriber_count,
        }
    }
}

impl Default for SourceCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Source-level statistics
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    /// Time since the source was registered
    pub uptime: Duration,
    /// Frames encoded and handed to the output channel (including drops)
    pub frames_produced: u64,
    /// Frames dropped because the output channel was full
    pub output_drops: u64,
    /// Frames skipped because encoding failed
    pub encode_failures: u64,
    /// Empty frames discarded before encoding
    pub empty_frames: u64,
    /// Times a file source was rewound after a read failure
    pub loop_restarts: u64,
    /// Frames fanned out by the distributor
    pub frames_distributed: u64,
    /// Per-subscriber deliveries skipped because a queue was full
    pub subscriber_drops: u64,
    /// Total encoded payload bytes
    pub bytes_produced: u64,
    /// Subscribers currently attached
    pub subscriber_count: usize,
}

impl SourceStats {
    /// Effective output frame rate since registration
    pub fn framerate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.frames_produced as f64 / secs
        } else {
            0.0
        }
    }

    /// Average payload bitrate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.uptime.as_secs();
        if secs > 0 {
            (self.bytes_produced * 8) / secs
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let stats = SourceCounters::new().snapshot(0);
        assert_eq!(stats.frames_produced, 0);
        assert_eq!(stats.output_drops, 0);
        assert_eq!(stats.encode_failures, 0);
        assert_eq!(stats.loop_restarts, 0);
        assert_eq!(stats.subscriber_drops, 0);
        assert_eq!(stats.subscriber_count, 0);
    }

    #[test]
    fn test_counters_record() {
        let counters = SourceCounters::new();
        counters.record_produced(1000);
        counters.record_produced(500);
        counters.record_output_drop();
        counters.record_encode_failure();
        counters.record_empty_frame();
        counters.record_loop_restart();
        counters.record_distributed(2);
        counters.record_distributed(0);

        let stats = counters.snapshot(3);
        assert_eq!(stats.frames_produced, 2);
        assert_eq!(stats.bytes_produced, 1500);
        assert_eq!(stats.output_drops, 1);
        assert_eq!(stats.encode_failures, 1);
        assert_eq!(stats.empty_frames, 1);
        assert_eq!(stats.loop_restarts, 1);
        assert_eq!(stats.frames_distributed, 2);
        assert_eq!(stats.subscriber_drops, 2);
        assert_eq!(stats.subscriber_count, 3);
    }

    #[test]
    fn test_bitrate() {
        let stats = SourceStats {
            uptime: Duration::from_secs(10),
            bytes_produced: 1_000_000,
            ..Default::default()
        };

        // 1,000,000 bytes * 8 bits / 10 seconds = 800,000 bps
        assert_eq!(stats.bitrate(), 800_000);
    }

    #[test]
    fn test_rates_zero_uptime() {
        let stats = SourceStats {
            frames_produced: 30,
            bytes_produced: 1_000,
            ..Default::default()
        };
        assert_eq!(stats.bitrate(), 0);
        assert_eq!(stats.framerate(), 0.0);
    }

    #[test]
    fn test_framerate() {
        let stats = SourceStats {
            uptime: Duration::from_secs(2),
            frames_produced: 60,
            ..Default::default()
        };
        assert!((stats.framerate() - 30.0).abs() < f64::EPSILON);
    }
}
