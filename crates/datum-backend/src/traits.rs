//! The [`StorageBackend`] trait defining the byte storage interface.
//!
//! Any backend (filesystem, in-memory, database) implements this trait to
//! provide durable byte streams for the codec layer. Locations are opaque
//! UTF-8 strings; only the backend assigns them meaning.

use async_trait::async_trait;

use crate::error::BackendResult;

/// Byte-oriented storage over named locations.
///
/// All implementations must satisfy these invariants:
/// - A single `write_all` replaces the location's contents with
///   all-or-nothing visibility: a reader never observes a prefix of the
///   new bytes.
/// - `delete` is idempotent; deleting a missing location succeeds.
/// - `read_all` reports a missing location as a distinct `NotFound` error,
///   never as empty bytes.
/// - The backend never interprets the bytes it stores.
/// - All other I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Check whether a location currently holds bytes.
    async fn exists(&self, location: &str) -> BackendResult<bool>;

    /// Read the full contents of a location.
    ///
    /// Returns the `NotFound` error if the location does not exist.
    async fn read_all(&self, location: &str) -> BackendResult<Vec<u8>>;

    /// Replace the full contents of a location.
    ///
    /// Atomic with respect to readers: they see either the old bytes or the
    /// new bytes in full.
    async fn write_all(&self, location: &str, bytes: &[u8]) -> BackendResult<()>;

    /// Delete a location.
    ///
    /// Deleting a location that does not exist is a no-op, not an error.
    async fn delete(&self, location: &str) -> BackendResult<()>;
}
