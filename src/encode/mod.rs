//! Frame payload encoding
//!
//! Raw frames are encoded once by the producer; the resulting payload is shared
//! by every subscriber through `Bytes` reference counting.

pub mod jpeg;

use bytes::Bytes;

use crate::capture::RawFrame;

pub use jpeg::JpegEncoder;

/// Error encoding a single frame
///
/// Encoding failures only ever skip the frame in question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError(pub String);

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to encode frame: {}", self.0)
    }
}

impl std::error::Error for EncodeError {}

/// Converts raw frames into the output payload format
pub trait FrameEncoder: Send + Sync + 'static {
    fn encode(&self, frame: &RawFrame) -> Result<Bytes, EncodeError>;
}
