//! Codec layer for the datum single-value store.
//!
//! A [`Codec`] composes a byte-oriented storage backend with a serializer
//! to persist one typed value durably. Two implementations are provided:
//!
//! - [`PlainCodec`] -- the serialized value at one location, nothing else
//! - [`VersionedCodec`] -- adds a side-channel schema version marker and a
//!   migration hook that repairs stale on-disk data into the current type
//!
//! # Absence vs. corruption
//!
//! The states a location can be in are kept strictly apart:
//!
//! - missing location -> `Ok(None)` ("no value", a first-class state)
//! - readable value -> `Ok(Some(value))`
//! - unreadable bytes -> `Err(Malformed)`, or the migration path for the
//!   versioned codec
//!
//! A parse failure is never reported as absence, and absence is never an
//! error.
//!
//! # Versioning
//!
//! The marker is written strictly before the value on every encode and
//! deleted together with the value on clear, so a readable value is always
//! at least as new as its marker claims. A decode that fails the typed
//! parse re-reads the bytes as [`LooseValue`] and hands both the recorded
//! version (0 when no marker exists) and the loose form to the store's
//! [`MigrationFn`].

pub mod error;
pub mod plain;
pub mod serialize;
pub mod traits;
pub mod versioned;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{CodecError, CodecResult, MigrationError};
pub use plain::PlainCodec;
pub use serialize::{
    BincodeSerializer, JsonSerializer, LooseValue, SerializeError, SerializeResult, Serializer,
};
pub use traits::Codec;
pub use versioned::{migrate_to, MigrationFn, VersionedCodec, VERSION_SUFFIX};
