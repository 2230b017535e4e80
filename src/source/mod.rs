//! Source identity and configuration
//!
//! A source is described by its kind and a uri. The pair is immutable once the
//! source is registered and deterministically names it (`<kind>_<uri>`).

pub mod config;

pub use config::{SourceConfig, SourceId, SourceInfo, SourceKind};
