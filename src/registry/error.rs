//! Registry error types
//!
//! Error types for source registry operations. Only these reach callers;
//! failures inside a running producer end the source instead.

use crate::capture::BackendError;
use crate::source::SourceId;

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Unsupported source type or unusable uri
    Config(String),
    /// A source with the same (type, uri) is already registered
    AlreadyExists(SourceId),
    /// The capture backend could not be opened
    BackendOpen(SourceId, BackendError),
    /// No source registered under this id
    NotFound(SourceId),
}

/// Coarse error classification for transports mapping errors to status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    AlreadyExists,
    BackendOpen,
    NotFound,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Config(_) => ErrorKind::Config,
            RegistryError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RegistryError::BackendOpen(..) => ErrorKind::BackendOpen,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Config(msg) => write!(f, "Invalid source config: {}", msg),
            RegistryError::AlreadyExists(id) => write!(f, "Source already exists: {}", id),
            RegistryError::BackendOpen(id, err) => {
                write!(f, "Failed to start source {}: {}", id, err)
            }
            RegistryError::NotFound(id) => write!(f, "Source not found: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::BackendOpen(_, err) => Some(err),
            _ => None,
        }
    }
}
