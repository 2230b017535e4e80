//! Source configuration types

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

/// Kind of capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Local video file, played in a loop
    File,
    /// Local capture device, addressed by index
    Webcam,
    /// Network stream (RTSP/HTTP)
    IpCamera,
}

impl SourceKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Webcam => "webcam",
            SourceKind::IpCamera => "ip_camera",
        }
    }

    /// Whether read failures restart playback instead of ending the source
    pub fn loops_on_read_failure(&self) -> bool {
        matches!(self, SourceKind::File)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(SourceKind::File),
            "webcam" => Ok(SourceKind::Webcam),
            "ip_camera" => Ok(SourceKind::IpCamera),
            other => Err(RegistryError::Config(format!(
                "unsupported source type: {}",
                other
            ))),
        }
    }
}

/// Configuration for a single source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// For files a path, for webcams a device index, for IP cameras a URL
    pub uri: String,
}

impl SourceConfig {
    /// Create a new source configuration
    pub fn new(kind: SourceKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
        }
    }

    /// Build a configuration from the wire name of the kind
    pub fn parse(kind: &str, uri: impl Into<String>) -> Result<Self, RegistryError> {
        Ok(Self::new(kind.parse()?, uri))
    }

    /// Identifier this configuration registers under
    pub fn id(&self) -> SourceId {
        SourceId::derive(self.kind, &self.uri)
    }

    /// Device index for webcam sources
    ///
    /// A uri that is not a number selects the default device 0.
    pub fn device_index(&self) -> Option<u32> {
        match self.kind {
            SourceKind::Webcam => Some(self.uri.trim().parse().unwrap_or(0)),
            _ => None,
        }
    }
}

/// Registry key for a source
///
/// Cheap to clone: every frame carries one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Derive the id for a (kind, uri) pair
    pub fn derive(kind: SourceKind, uri: &str) -> Self {
        Self(format!("{}_{}", kind, uri).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

/// Point-in-time description of a registered source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub id: SourceId,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub uri: String,
    pub is_streaming: bool,
}
