//! Frames delivered to subscribers

use std::time::SystemTime;

use bytes::Bytes;

use crate::source::SourceId;

/// One encoded frame from a source
///
/// Cheap to clone: the payload is reference counted and the source id is a
/// shared string, so fan-out to many subscribers never copies image data.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Per-source sequence number, starting at 0
    ///
    /// Strictly increasing; gaps mean frames were dropped.
    pub sequence: u64,
    /// Wall-clock capture time
    pub captured_at: SystemTime,
    /// Encoded image (JPEG by default)
    pub payload: Bytes,
    /// Source this frame came from
    pub source_id: SourceId,
}

impl Frame {
    /// Create a frame stamped with the current time
    pub fn new(source_id: SourceId, sequence: u64, payload: Bytes) -> Self {
        Self {
            sequence,
            captured_at: SystemTime::now(),
            payload,
            source_id,
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}
