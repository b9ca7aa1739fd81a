//! The serialization seam: typed bytes in and out, plus a loose decode.
//!
//! Codecs consume serialization as a capability. [`JsonSerializer`] is the
//! default (self-describing, migration-capable); [`BincodeSerializer`] is a
//! compact alternative for stores that never change shape.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// The structured intermediate form used as migration input.
///
/// A self-describing tagged union over null, booleans, numbers, strings,
/// arrays, and ordered key-value mappings. Any self-describing payload can
/// be decoded into this form without knowledge of the target type, even
/// after the target type has changed shape.
pub type LooseValue = serde_json::Value;

/// Parse and encode failures at the serialization seam.
///
/// Kept separate from I/O errors so the codec layer can tell "bytes are
/// unreadable" apart from "bytes are unreachable".
#[derive(Debug, Error)]
pub enum SerializeError {
    /// JSON encode/decode failure.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Bincode encode/decode failure.
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    /// The format cannot be decoded without the target type.
    #[error("format is not self-describing; loose decode unavailable")]
    NotSelfDescribing,
}

/// Convenience type alias for serialization operations.
pub type SerializeResult<T> = std::result::Result<T, SerializeError>;

/// Converts one value type to and from durable bytes.
///
/// `from_bytes_loose` is the migration entry point: it must succeed on any
/// bytes this serializer ever produced, even when the target type has since
/// changed shape. Formats that cannot do this report
/// [`SerializeError::NotSelfDescribing`], which makes migration unavailable
/// for stores using them.
pub trait Serializer<T>: Send + Sync {
    /// Encode a value to bytes.
    fn to_bytes(&self, value: &T) -> SerializeResult<Vec<u8>>;

    /// Decode bytes into the target type.
    fn from_bytes(&self, bytes: &[u8]) -> SerializeResult<T>;

    /// Decode bytes into the loose structured form, ignoring the target type.
    fn from_bytes_loose(&self, bytes: &[u8]) -> SerializeResult<LooseValue>;
}

/// JSON serializer: self-describing, migration-capable. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer {
    /// Pretty-print output (larger files, friendlier diffs).
    pub pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Pretty-printed JSON output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl<T> Serializer<T> for JsonSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self, value: &T) -> SerializeResult<Vec<u8>> {
        if self.pretty {
            Ok(serde_json::to_vec_pretty(value)?)
        } else {
            Ok(serde_json::to_vec(value)?)
        }
    }

    fn from_bytes(&self, bytes: &[u8]) -> SerializeResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn from_bytes_loose(&self, bytes: &[u8]) -> SerializeResult<LooseValue> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Bincode serializer: compact, not self-describing.
///
/// Values written with this serializer cannot be repaired across schema
/// changes; a versioned decode that falls back to the loose parse surfaces
/// `Malformed` instead of migrating.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    /// Create a bincode serializer.
    pub fn new() -> Self {
        Self
    }
}

impl<T> Serializer<T> for BincodeSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self, value: &T) -> SerializeResult<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn from_bytes(&self, bytes: &[u8]) -> SerializeResult<T> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn from_bytes_loose(&self, _bytes: &[u8]) -> SerializeResult<LooseValue> {
        Err(SerializeError::NotSelfDescribing)
    }
}
