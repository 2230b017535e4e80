//! Multi-source camera frame hub
//!
//! `camera-hub` captures frames from independently managed sources (video
//! files, webcams, network cameras) and fans them out to any number of
//! subscribers that come and go at runtime. Memory stays bounded: every queue
//! has a fixed capacity and frames are dropped, never buffered without limit,
//! when a consumer falls behind.
//!
//! The crate is the core of a camera service. Transports (HTTP, WebSocket,
//! gRPC) sit on top and call four operations on a [`SourceRegistry`]:
//! [`add_source`](SourceRegistry::add_source),
//! [`remove_source`](SourceRegistry::remove_source),
//! [`list_sources`](SourceRegistry::list_sources) and
//! [`subscribe`](SourceRegistry::subscribe).
//!
//! # Example
//! ```no_run
//! use camera_hub::capture::SyntheticFactory;
//! use camera_hub::{SourceConfig, SourceKind, SourceRegistry};
//!
//! # async fn example() -> Result<(), camera_hub::RegistryError> {
//! let registry = SourceRegistry::new(SyntheticFactory::default());
//!
//! let id = registry
//!     .add_source(SourceConfig::new(SourceKind::File, "clip.mp4"))
//!     .await?;
//! assert_eq!(id.as_str(), "file_clip.mp4");
//!
//! let mut frames = registry.subscribe(&id).await?;
//! while let Some(frame) = frames.recv().await {
//!     println!("frame {} ({} bytes)", frame.sequence, frame.payload.len());
//!     # break;
//! }
//!
//! registry.remove_source(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod encode;
pub mod lifecycle;
pub mod registry;
pub mod source;
pub mod stats;

pub use registry::{ErrorKind, Frame, RegistryConfig, RegistryError, SourceRegistry, Subscription};
pub use source::{SourceConfig, SourceId, SourceInfo, SourceKind};
pub use stats::SourceStats;
