//! The [`Codec`] trait defining the durable persistence contract.

use async_trait::async_trait;

use crate::error::CodecResult;

/// Durable persistence for a single typed value.
///
/// A codec is bound to one storage location for its lifetime and is
/// stateless between calls: it holds no open handles and no copy of the
/// value.
///
/// All implementations must satisfy these invariants:
/// - Decoding a location that holds no value yields `Ok(None)`, never an
///   error. Absence is a first-class state.
/// - Bytes that exist but cannot be reconstituted surface as an error;
///   corruption is never silently read as absence.
/// - Encoding `None` clears all persisted state and is idempotent.
/// - Encoding the same value repeatedly is safe.
#[async_trait]
pub trait Codec<T>: Send + Sync {
    /// Reconstitute the current value, or `None` if none is stored.
    async fn decode(&self) -> CodecResult<Option<T>>;

    /// Durably persist `value`, or clear all persisted state when `None`.
    async fn encode(&self, value: Option<&T>) -> CodecResult<()>;
}
