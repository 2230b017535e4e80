//! Synthetic capture backend
//!
//! Generates a moving test pattern at a fixed rate. File sources end after a
//! configurable clip length and can be rewound; device and network sources
//! can be configured to drop out after a number of frames.

use std::thread;
use std::time::Duration;

use crate::source::{SourceConfig, SourceKind};

use super::backend::{BackendError, BackendFactory, CaptureBackend, PixelFormat, RawFrame};

/// Parameters for generated frames
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Frames per second (0 = as fast as the reader pulls)
    pub fps: u32,
    /// Frames in one pass of a file source before end of stream
    pub clip_length: u64,
    /// Frames a webcam or IP camera delivers before it drops out (None = never)
    pub device_frame_limit: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fps: 30,
            clip_length: 300,
            device_frame_limit: None,
        }
    }
}

impl SyntheticConfig {
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn clip_length(mut self, frames: u64) -> Self {
        self.clip_length = frames;
        self
    }

    pub fn device_frame_limit(mut self, frames: u64) -> Self {
        self.device_frame_limit = Some(frames);
        self
    }
}

/// Factory producing [`SyntheticBackend`]s for every source kind
#[derive(Debug, Clone, Default)]
pub struct SyntheticFactory {
    config: SyntheticConfig,
}

impl SyntheticFactory {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }
}

impl BackendFactory for SyntheticFactory {
    fn open(&self, config: &SourceConfig) -> Result<Box<dyn CaptureBackend>, BackendError> {
        if self.config.width == 0 || self.config.height == 0 {
            return Err(BackendError::Open(format!(
                "invalid synthetic frame size {}x{}",
                self.config.width, self.config.height
            )));
        }

        // Webcams fall back to device 0; files and streams need a location
        if config.kind != SourceKind::Webcam && config.uri.trim().is_empty() {
            return Err(BackendError::Open(format!(
                "no {} source at empty uri",
                config.kind
            )));
        }

        tracing::debug!(
            kind = %config.kind,
            uri = %config.uri,
            width = self.config.width,
            height = self.config.height,
            "Synthetic backend opened"
        );

        Ok(Box::new(SyntheticBackend::new(
            config.kind,
            self.config.clone(),
        )))
    }
}

/// Test-pattern capture backend
pub struct SyntheticBackend {
    kind: SourceKind,
    config: SyntheticConfig,
    /// Position within the current clip
    position: u64,
    /// Frames delivered since open
    delivered: u64,
    closed: bool,
}

impl SyntheticBackend {
    pub fn new(kind: SourceKind, config: SyntheticConfig) -> Self {
        Self {
            kind,
            config,
            position: 0,
            delivered: 0,
            closed: false,
        }
    }

    fn frame_interval(&self) -> Option<Duration> {
        if self.config.fps == 0 {
            None
        } else {
            Some(Duration::from_secs(1) / self.config.fps)
        }
    }

    fn render(&self) -> RawFrame {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let shift = self.position as usize;
        let mut pixels = Vec::with_capacity(width * height * 3);

        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + shift) % 256) as u8);
                pixels.push(((y + shift) % 256) as u8);
                pixels.push(((x + y) % 256) as u8);
            }
        }

        RawFrame::new(
            self.config.width,
            self.config.height,
            PixelFormat::Rgb8,
            pixels,
        )
    }
}

impl CaptureBackend for SyntheticBackend {
    fn read_frame(&mut self) -> Result<RawFrame, BackendError> {
        if self.closed {
            return Err(BackendError::Read("backend closed".into()));
        }

        match self.kind {
            SourceKind::File if self.position >= self.config.clip_length => {
                return Err(BackendError::Read("end of stream".into()));
            }
            SourceKind::Webcam | SourceKind::IpCamera => {
                if let Some(limit) = self.config.device_frame_limit {
                    if self.delivered >= limit {
                        return Err(BackendError::Read("device disconnected".into()));
                    }
                }
            }
            SourceKind::File => {}
        }

        if let Some(interval) = self.frame_interval() {
            thread::sleep(interval);
        }

        let frame = self.render();
        self.position += 1;
        self.delivered += 1;
        Ok(frame)
    }

    fn seek_to_start(&mut self) -> Result<(), BackendError> {
        if self.kind != SourceKind::File {
            return Err(BackendError::Seek(format!(
                "{} sources cannot seek",
                self.kind
            )));
        }
        self.position = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> SyntheticConfig {
        SyntheticConfig::default().size(4, 2).fps(0)
    }

    #[test]
    fn test_file_clip_ends_and_rewinds() {
        let mut backend = SyntheticBackend::new(SourceKind::File, fast().clip_length(2));

        assert!(backend.read_frame().is_ok());
        assert!(backend.read_frame().is_ok());
        assert!(matches!(backend.read_frame(), Err(BackendError::Read(_))));

        backend.seek_to_start().unwrap();
        let frame = backend.read_frame().unwrap();
        assert_eq!(frame.data.len(), frame.expected_len());
    }

    #[test]
    fn test_device_drops_out() {
        let mut backend =
            SyntheticBackend::new(SourceKind::Webcam, fast().device_frame_limit(1));

        assert!(backend.read_frame().is_ok());
        assert!(matches!(backend.read_frame(), Err(BackendError::Read(_))));
        assert!(matches!(backend.seek_to_start(), Err(BackendError::Seek(_))));
    }

    #[test]
    fn test_closed_backend_fails_reads() {
        let mut backend = SyntheticBackend::new(SourceKind::IpCamera, fast());
        backend.close();
        assert!(backend.read_frame().is_err());
    }

    #[test]
    fn test_factory_requires_location() {
        let factory = SyntheticFactory::new(fast());

        let result = factory.open(&SourceConfig::new(SourceKind::File, ""));
        assert!(matches!(result, Err(BackendError::Open(_))));
        let result = factory.open(&SourceConfig::new(SourceKind::IpCamera, " "));
        assert!(matches!(result, Err(BackendError::Open(_))));

        assert!(factory.open(&SourceConfig::new(SourceKind::Webcam, "")).is_ok());
    }

    #[test]
    fn test_factory_rejects_zero_size() {
        let factory = SyntheticFactory::new(SyntheticConfig::default().size(0, 0));
        let config = SourceConfig::new(SourceKind::File, "clip.mp4");
        assert!(matches!(factory.open(&config), Err(BackendError::Open(_))));
    }
}
