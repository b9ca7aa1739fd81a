//! The value store: snapshot cache plus codec composition.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use datum_backend::FsBackend;
use datum_codec::{
    migrate_to, Codec, CodecResult, JsonSerializer, MigrationFn, PlainCodec, VersionedCodec,
};

use crate::options::StoreOptions;

/// A durable store for a single typed value.
///
/// The store owns an in-memory snapshot of the last known value and
/// serializes every operation through one lock, so a read-modify-write
/// (`update`) never interleaves with another operation and two writers can
/// never race the codec's marker/value write ordering.
///
/// All durable state lives in the codec's storage locations; dropping the
/// store loses nothing but the snapshot.
pub struct ValueStore<T: 'static> {
    codec: Arc<dyn Codec<T>>,
    options: StoreOptions<T>,
    /// `None` = cold (nothing read or written yet); `Some(state)` = last
    /// known durable state, where `state` is itself present-or-absent.
    snapshot: Mutex<Option<Option<T>>>,
}

impl<T> ValueStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a store over an explicit codec.
    pub fn with_codec(codec: Arc<dyn Codec<T>>, options: StoreOptions<T>) -> Self {
        Self {
            codec,
            options,
            snapshot: Mutex::new(None),
        }
    }

    /// Current value, or the configured default when nothing is stored.
    pub async fn get(&self) -> CodecResult<Option<T>> {
        let mut snapshot = self.snapshot.lock().await;
        let state = self.read_state(&mut snapshot).await?;
        Ok(state.or_else(|| self.options.default_value.clone()))
    }

    /// Persist `value`, replacing whatever is stored.
    pub async fn set(&self, value: T) -> CodecResult<()> {
        let mut snapshot = self.snapshot.lock().await;
        self.write_state(&mut snapshot, Some(value)).await
    }

    /// Read-transform-write as one atomic step. Returns the new value.
    ///
    /// The transform sees what `get` would return (including the default
    /// fallback), and its output is persisted even when `None`, which
    /// clears the store.
    pub async fn update<F>(&self, transform: F) -> CodecResult<Option<T>>
    where
        F: FnOnce(Option<T>) -> Option<T> + Send,
    {
        let mut snapshot = self.snapshot.lock().await;
        let current = self
            .read_state(&mut snapshot)
            .await?
            .or_else(|| self.options.default_value.clone());
        let next = transform(current);
        self.write_state(&mut snapshot, next.clone()).await?;
        Ok(next)
    }

    /// Clear the stored value. Idempotent.
    pub async fn delete(&self) -> CodecResult<()> {
        let mut snapshot = self.snapshot.lock().await;
        self.write_state(&mut snapshot, None).await
    }

    /// Replace the stored value with the configured default (clears the
    /// store when no default is configured).
    pub async fn reset(&self) -> CodecResult<()> {
        let mut snapshot = self.snapshot.lock().await;
        let default = self.options.default_value.clone();
        self.write_state(&mut snapshot, default).await
    }

    /// Last known durable state, decoding on a cold or disabled cache.
    async fn read_state(&self, snapshot: &mut Option<Option<T>>) -> CodecResult<Option<T>> {
        if self.options.enable_cache {
            if let Some(state) = snapshot.as_ref() {
                return Ok(state.clone());
            }
        }
        let state = self.codec.decode().await?;
        debug!(present = state.is_some(), "decoded durable state");
        if self.options.enable_cache {
            *snapshot = Some(state.clone());
        }
        Ok(state)
    }

    /// Encode first, then move the snapshot; a failed encode leaves the
    /// snapshot at the previous durable state.
    async fn write_state(
        &self,
        snapshot: &mut Option<Option<T>>,
        state: Option<T>,
    ) -> CodecResult<()> {
        self.codec.encode(state.as_ref()).await?;
        if self.options.enable_cache {
            *snapshot = Some(state);
        }
        Ok(())
    }
}

impl<T> ValueStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Store backed by a JSON file at `path`.
    pub fn open_json(path: impl Into<String>, options: StoreOptions<T>) -> Self {
        let codec = PlainCodec::new(Arc::new(FsBackend::new()), path, JsonSerializer::new());
        Self::with_codec(Arc::new(codec), options)
    }

    /// Versioned store backed by a JSON file at `path`, with the marker at
    /// the derived `.version` sibling path.
    ///
    /// When `migration` is `None` the default hook is used: stale data is
    /// replaced with the configured default value.
    pub fn open_versioned_json(
        path: impl Into<String>,
        version: u32,
        migration: Option<MigrationFn<T>>,
        options: StoreOptions<T>,
    ) -> Self {
        let migration =
            migration.unwrap_or_else(|| migrate_to(options.default_value.clone()));
        let codec = VersionedCodec::new(
            Arc::new(FsBackend::new()),
            path,
            version,
            migration,
            JsonSerializer::new(),
        );
        Self::with_codec(Arc::new(codec), options)
    }
}

impl<T: 'static> std::fmt::Debug for ValueStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStore")
            .field("enable_cache", &self.options.enable_cache)
            .finish()
    }
}
