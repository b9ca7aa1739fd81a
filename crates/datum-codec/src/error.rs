//! Error types for codec operations.

use thiserror::Error;

use datum_backend::BackendError;

use crate::serialize::SerializeError;

/// Failure produced by a user-supplied migration function.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct MigrationError {
    /// What the migration could not do with the stale data.
    pub reason: String,
}

impl MigrationError {
    /// Create a migration error from a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while encoding or decoding the stored value.
///
/// A missing location is never an error at this layer: decode reports it as
/// `Ok(None)` and clear treats it as success.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes exist at the location but cannot be parsed into any usable
    /// form (the target type, and for versioned codecs also the loose
    /// structured form). Indicates true corruption or an unsupported
    /// migration path.
    #[error("malformed data at {location}: {source}")]
    Malformed {
        location: String,
        #[source]
        source: SerializeError,
    },

    /// A value could not be serialized for writing.
    #[error("failed to serialize value for {location}: {source}")]
    Serialization {
        location: String,
        #[source]
        source: SerializeError,
    },

    /// The migration hook failed while repairing stale data.
    #[error("migration from version {from_version} failed: {source}")]
    Migration {
        from_version: u32,
        #[source]
        source: MigrationError,
    },

    /// Failure in the underlying storage backend.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Convenience type alias for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
