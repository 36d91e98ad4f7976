//! Error types for the storage estimator
//!
//! Configuration and input errors abort a build. Traversal errors are
//! recovered per path by the explorer and only surface in its counters.

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for estimator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the estimator
#[derive(Debug, Error)]
pub enum Error {
    // Build errors
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Traversal errors
    #[error("cannot read {}: {source}", path.display())]
    TraversalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown entry kind: {}", path.display())]
    UnknownEntryKind { path: PathBuf },

    // Front-end errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Wrap a directory enumeration failure
    pub fn traversal_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TraversalIo {
            path: path.into(),
            source,
        }
    }

    /// Check if this error aborts the current build
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_) | Self::InvalidInput(_))
    }

    /// Check if this error is recovered locally during traversal
    #[must_use]
    pub const fn is_traversal(&self) -> bool {
        matches!(
            self,
            Self::TraversalIo { .. } | Self::UnknownEntryKind { .. }
        )
    }
}
