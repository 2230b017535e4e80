//! Capture backend adapters
//!
//! A capture backend wraps a platform capture API (a decoder for files, a
//! device driver for webcams, a network client for IP cameras). The hub only
//! needs three things from it:
//!
//! - `read_frame()`: block until the next decoded frame is available
//! - `seek_to_start()`: rewind, used to loop file playback
//! - `close()`: release the underlying resource
//!
//! Backends are created through a [`BackendFactory`], chosen once when the
//! registry is built, so the producer loop never branches on source kind to
//! drive the device.
//!
//! The crate ships a [`SyntheticFactory`] which generates test-pattern frames.
//! It stands in for a real device in demos and tests.

pub mod backend;
pub mod synthetic;

pub use backend::{BackendError, BackendFactory, CaptureBackend, PixelFormat, RawFrame};
pub use synthetic::{SyntheticBackend, SyntheticConfig, SyntheticFactory};
