//! Capture backend traits and raw frame type

use bytes::Bytes;

use crate::source::SourceConfig;

/// Pixel layout of a raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGB, 3 bytes per pixel
    Rgb8,
    /// 8-bit luma, 1 byte per pixel
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A decoded frame as produced by a capture backend
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Tightly packed pixel rows
    pub data: Bytes,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            format,
            data: data.into(),
        }
    }

    /// A frame with no pixels, as some devices return while warming up
    pub fn empty() -> Self {
        Self::new(0, 0, PixelFormat::Rgb8, Bytes::new())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    /// Byte length implied by the dimensions and pixel format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Errors reported by a capture backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be initialized
    Open(String),
    /// Reading the next frame failed (end of file, device lost, network error)
    Read(String),
    /// Rewinding to the start failed
    Seek(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Open(msg) => write!(f, "failed to open capture backend: {}", msg),
            BackendError::Read(msg) => write!(f, "failed to read frame: {}", msg),
            BackendError::Seek(msg) => write!(f, "failed to seek to start: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// One open capture session
///
/// Methods are blocking; the producer drives them from the blocking thread
/// pool. A read in flight cannot be interrupted, so implementations that need
/// bounded shutdown latency should bound their own read timeout.
pub trait CaptureBackend: Send + 'static {
    /// Block until the next frame is decoded
    fn read_frame(&mut self) -> Result<RawFrame, BackendError>;

    /// Rewind to the first frame
    ///
    /// Only file-like backends support this; the default refuses.
    fn seek_to_start(&mut self) -> Result<(), BackendError> {
        Err(BackendError::Seek("backend does not support seeking".into()))
    }

    /// Release the underlying resource
    fn close(&mut self);
}

/// Opens capture backends for source configurations
pub trait BackendFactory: Send + Sync + 'static {
    fn open(&self, config: &SourceConfig) -> Result<Box<dyn CaptureBackend>, BackendError>;
}

impl<F> BackendFactory for F
where
    F: Fn(&SourceConfig) -> Result<Box<dyn CaptureBackend>, BackendError> + Send + Sync + 'static,
{
    fn open(&self, config: &SourceConfig) -> Result<Box<dyn CaptureBackend>, BackendError> {
        self(config)
    }
}
