//! Store configuration.

/// Options controlling a store's read and cache behavior.
#[derive(Clone, Debug)]
pub struct StoreOptions<T> {
    /// Value returned by `get` when nothing has ever been persisted (or the
    /// store was cleared). Returned as a fallback only; `get` never writes
    /// it to storage.
    pub default_value: Option<T>,

    /// Keep an in-memory snapshot of the last known value, skipping the
    /// codec on repeat reads. Disable to force a durable read on every
    /// `get` (e.g. when another process may touch the same location).
    pub enable_cache: bool,
}

impl<T> Default for StoreOptions<T> {
    fn default() -> Self {
        Self {
            default_value: None,
            enable_cache: true,
        }
    }
}

impl<T> StoreOptions<T> {
    /// Options with a default value and caching enabled.
    pub fn with_default(default_value: T) -> Self {
        Self {
            default_value: Some(default_value),
            enable_cache: true,
        }
    }

    /// Disable the in-memory snapshot.
    pub fn without_cache(mut self) -> Self {
        self.enable_cache = false;
        self
    }
}
