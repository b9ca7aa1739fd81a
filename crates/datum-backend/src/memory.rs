//! In-memory, HashMap-based storage.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{BackendError, BackendResult};
use crate::traits::StorageBackend;

/// In-memory storage backend.
///
/// Intended for tests and embedding. All entries are held in memory behind
/// a `RwLock` for safe concurrent access. Bytes are cloned on read/write.
/// Writes to a `HashMap` entry are inherently all-or-nothing, which
/// satisfies the atomic-replace contract for free.
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of locations currently holding bytes.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no location holds bytes.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all locations holding bytes.
    pub fn locations(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut locations: Vec<String> = map.keys().cloned().collect();
        locations.sort();
        locations
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn exists(&self, location: &str) -> BackendResult<bool> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(location))
    }

    async fn read_all(&self, location: &str) -> BackendResult<Vec<u8>> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(location).cloned().ok_or_else(|| BackendError::NotFound {
            location: location.to_string(),
        })
    }

    async fn write_all(&self, location: &str, bytes: &[u8]) -> BackendResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(location.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, location: &str) -> BackendResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        // Idempotent: removing a missing entry is fine.
        map.remove(location);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryBackend")
            .field("location_count", &count)
            .finish()
    }
}
