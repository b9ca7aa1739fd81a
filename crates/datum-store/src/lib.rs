//! A durable store for one typed value.
//!
//! [`ValueStore`] composes a codec (see `datum-codec`) with an in-memory
//! snapshot of the last known value and a per-store lock. All operations --
//! [`get`](ValueStore::get), [`set`](ValueStore::set),
//! [`update`](ValueStore::update), [`delete`](ValueStore::delete),
//! [`reset`](ValueStore::reset) -- run inside that lock, so read-modify-write
//! sequences never interleave for one store instance.
//!
//! # Example
//!
//! ```no_run
//! use datum_store::{StoreOptions, ValueStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct Profile {
//!     name: String,
//! }
//!
//! # async fn demo() -> datum_store::CodecResult<()> {
//! let store: ValueStore<Profile> = ValueStore::open_json(
//!     "profile.json",
//!     StoreOptions::with_default(Profile { name: "Tom".into() }),
//! );
//! store.update(|p| p.map(|mut p| { p.name.push('!'); p })).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! The store adds no error kinds of its own: everything surfaces unchanged
//! from the codec layer, and a failed operation leaves the snapshot at the
//! last durable state.
//!
//! # Limitations
//!
//! The snapshot is owned by one store instance. Other processes (or other
//! instances bound to the same location) are not coordinated with; disable
//! the cache if the location can change out from under the store.

pub mod options;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use options::StoreOptions;
pub use store::ValueStore;

// The store introduces no error kinds of its own.
pub use datum_codec::{CodecError, CodecResult};
