//! Error types for storage backend operations.

use thiserror::Error;

/// Errors that can occur during byte-oriented storage operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The named location does not exist.
    #[error("location not found: {location}")]
    NotFound { location: String },

    /// I/O error from the underlying medium.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Returns `true` if this error means the location simply does not exist.
    ///
    /// Callers that treat absence as a first-class state (the codec layer
    /// does) match on this before propagating.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

/// Convenience type alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
