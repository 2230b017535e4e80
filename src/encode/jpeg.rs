//! JPEG payload encoder

use bytes::Bytes;
use image::codecs::jpeg;
use image::ExtendedColorType;

use crate::capture::{PixelFormat, RawFrame};

use super::{EncodeError, FrameEncoder};

/// Default JPEG quality (0-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encodes raw frames as baseline JPEG
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&self, frame: &RawFrame) -> Result<Bytes, EncodeError> {
        if frame.data.len() != frame.expected_len() {
            return Err(EncodeError(format!(
                "{}x{} frame needs {} bytes, got {}",
                frame.width,
                frame.height,
                frame.expected_len(),
                frame.data.len()
            )));
        }

        let color = match frame.format {
            PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
            PixelFormat::Gray8 => ExtendedColorType::L8,
        };

        // Compressed size is usually well under a tenth of the raw size
        let mut out = Vec::with_capacity(frame.data.len() / 8);
        jpeg::JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode(&frame.data, frame.width, frame.height, color)
            .map_err(|e| EncodeError(e.to_string()))?;

        Ok(Bytes::from(out))
    }
}
