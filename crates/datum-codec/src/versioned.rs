//! Versioned codec: schema drift detection and migration.
//!
//! A versioned codec keeps a small integer marker next to the value (by
//! default at the value's location with a `.version` suffix) recording the
//! schema version the value was last written under. When stored bytes no
//! longer parse as the current type, they are re-read as the loose
//! structured form and handed to a user-supplied migration hook together
//! with that recorded version.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use datum_backend::{BackendError, StorageBackend};

use crate::error::{CodecError, CodecResult, MigrationError};
use crate::serialize::{LooseValue, Serializer};
use crate::traits::Codec;

/// Suffix appended to the value location to derive the marker location.
pub const VERSION_SUFFIX: &str = ".version";

/// Migration hook: given the version the stored bytes were written under
/// and their loose structured form, produce a current value.
///
/// Returning `Ok(None)` is a legitimate outcome ("no sensible migrated
/// value") and leaves the store empty; it is not a failure.
pub type MigrationFn<T> =
    Arc<dyn Fn(u32, Option<LooseValue>) -> Result<Option<T>, MigrationError> + Send + Sync>;

/// Migration that discards stale data and lands on a fixed value.
///
/// Used as the default hook when none is supplied: any out-of-date payload
/// is replaced with `fallback`, whatever its previous version or shape.
pub fn migrate_to<T>(fallback: Option<T>) -> MigrationFn<T>
where
    T: Clone + Send + Sync + 'static,
{
    Arc::new(move |_, _| Ok(fallback.clone()))
}

/// Codec wrapping one location with a version marker and a migration hook.
///
/// The marker is advisory metadata: decode is driven entirely by the value
/// location's existence and parseability, and the marker is consulted only
/// as migration input. An orphan marker (value deleted out from under it)
/// therefore never makes decode fail.
pub struct VersionedCodec<T: 'static, S> {
    backend: Arc<dyn StorageBackend>,
    location: String,
    marker_location: String,
    version: u32,
    migration: MigrationFn<T>,
    serializer: S,
}

impl<T: 'static, S> VersionedCodec<T, S> {
    /// Bind a versioned codec to `location`, with the marker at the default
    /// derived location (`location` + `".version"`).
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        location: impl Into<String>,
        version: u32,
        migration: MigrationFn<T>,
        serializer: S,
    ) -> Self {
        let location = location.into();
        let marker_location = format!("{location}{VERSION_SUFFIX}");
        Self {
            backend,
            location,
            marker_location,
            version,
            migration,
            serializer,
        }
    }

    /// Override the derived marker location.
    pub fn with_marker_location(mut self, marker_location: impl Into<String>) -> Self {
        self.marker_location = marker_location.into();
        self
    }

    /// The location the value is stored at.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The location the version marker is stored at.
    pub fn marker_location(&self) -> &str {
        &self.marker_location
    }

    /// The schema version this codec writes.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Read the version the stored bytes were written under.
    ///
    /// A missing marker means the bytes predate versioning: version 0.
    async fn stored_version(&self) -> CodecResult<u32> {
        let bytes = match self.backend.read_all(&self.marker_location).await {
            Ok(bytes) => bytes,
            Err(BackendError::NotFound { .. }) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| CodecError::Malformed {
            location: self.marker_location.clone(),
            source: e.into(),
        })
    }
}

#[async_trait]
impl<T, S> Codec<T> for VersionedCodec<T, S>
where
    T: Send + Sync + 'static,
    S: Serializer<T>,
{
    async fn decode(&self) -> CodecResult<Option<T>> {
        let bytes = match self.backend.read_all(&self.location).await {
            Ok(bytes) => bytes,
            Err(BackendError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Fast path: the bytes parse as the current type. The marker is not
        // consulted; encode writes the marker before a compatible value, so
        // a readable value is implicitly current.
        let parse_failure = match self.serializer.from_bytes(&bytes) {
            Ok(value) => return Ok(Some(value)),
            Err(source) => source,
        };

        let from_version = self.stored_version().await?;
        warn!(
            location = %self.location,
            from_version,
            target_version = self.version,
            error = %parse_failure,
            "stored value does not parse as current type; migrating"
        );

        // The loose parse must succeed even though the typed parse failed;
        // bytes unreadable under any schema are fatal.
        let loose = self
            .serializer
            .from_bytes_loose(&bytes)
            .map_err(|source| CodecError::Malformed {
                location: self.location.clone(),
                source,
            })?;

        let migrated = (self.migration)(from_version, Some(loose))
            .map_err(|source| CodecError::Migration {
                from_version,
                source,
            })?;
        debug!(
            location = %self.location,
            from_version,
            produced_value = migrated.is_some(),
            "migration complete"
        );
        Ok(migrated)
    }

    async fn encode(&self, value: Option<&T>) -> CodecResult<()> {
        match value {
            Some(value) => {
                let bytes =
                    self.serializer
                        .to_bytes(value)
                        .map_err(|source| CodecError::Serialization {
                            location: self.location.clone(),
                            source,
                        })?;
                let marker = serde_json::to_vec(&self.version).map_err(|e| {
                    CodecError::Serialization {
                        location: self.marker_location.clone(),
                        source: e.into(),
                    }
                })?;
                // Marker strictly before value: a reader must never find a
                // readable value whose marker still claims an older schema.
                self.backend.write_all(&self.marker_location, &marker).await?;
                self.backend.write_all(&self.location, &bytes).await?;
                debug!(
                    location = %self.location,
                    version = self.version,
                    len = bytes.len(),
                    "encoded versioned value"
                );
            }
            None => {
                // Marker first on clear as well; both deletes are idempotent.
                self.backend.delete(&self.marker_location).await?;
                self.backend.delete(&self.location).await?;
                debug!(location = %self.location, "cleared versioned value");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{BincodeSerializer, JsonSerializer};
    use datum_backend::InMemoryBackend;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Shape written by older releases.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct NoteV1 {
        text: String,
    }

    /// Current shape. `pinned` has no default, so V1 payloads fail the
    /// typed parse and take the migration path.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
        pinned: bool,
    }

    fn no_migration() -> MigrationFn<Note> {
        Arc::new(|version, _| {
            Err(MigrationError::new(format!(
                "unexpected migration from version {version}"
            )))
        })
    }

    fn codec(
        backend: Arc<InMemoryBackend>,
        version: u32,
        migration: MigrationFn<Note>,
    ) -> VersionedCodec<Note, JsonSerializer> {
        VersionedCodec::new(backend, "note", version, migration, JsonSerializer::new())
    }

    async fn write_v1(backend: &InMemoryBackend, text: &str, marker: Option<u32>) {
        let bytes = serde_json::to_vec(&NoteV1 {
            text: text.to_string(),
        })
        .unwrap();
        backend.write_all("note", &bytes).await.unwrap();
        if let Some(version) = marker {
            let marker_bytes = serde_json::to_vec(&version).unwrap();
            backend.write_all("note.version", &marker_bytes).await.unwrap();
        }
    }

    // -----------------------------------------------------------------------
    // Round trip at a stable version
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn encode_then_decode_round_trips_without_migration() {
        let backend = Arc::new(InMemoryBackend::new());
        let codec = codec(Arc::clone(&backend), 2, no_migration());
        let value = Note {
            text: "hello".to_string(),
            pinned: true,
        };

        codec.encode(Some(&value)).await.unwrap();
        let back = codec.decode().await.unwrap();
        assert_eq!(back, Some(value));
    }

    #[tokio::test]
    async fn encode_writes_decimal_marker_next_to_value() {
        let backend = Arc::new(InMemoryBackend::new());
        let codec = codec(Arc::clone(&backend), 7, no_migration());
        let value = Note {
            text: "x".to_string(),
            pinned: false,
        };

        codec.encode(Some(&value)).await.unwrap();
        assert_eq!(backend.read_all("note.version").await.unwrap(), b"7");
        assert_eq!(backend.locations(), vec!["note", "note.version"]);
    }

    // -----------------------------------------------------------------------
    // Absence
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn decode_of_never_written_location_is_none() {
        let backend = Arc::new(InMemoryBackend::new());
        let codec = codec(backend, 2, no_migration());
        assert_eq!(codec.decode().await.unwrap(), None);
    }

    #[tokio::test]
    async fn orphan_marker_decodes_as_none_without_migration() {
        let backend = Arc::new(InMemoryBackend::new());
        let codec = codec(Arc::clone(&backend), 2, no_migration());
        let value = Note {
            text: "x".to_string(),
            pinned: false,
        };

        codec.encode(Some(&value)).await.unwrap();
        // Simulate a crash window: the value vanished, the marker survived.
        backend.delete("note").await.unwrap();

        assert_eq!(codec.decode().await.unwrap(), None);
    }

    #[tokio::test]
    async fn encode_none_clears_marker_and_value() {
        let backend = Arc::new(InMemoryBackend::new());
        let codec = codec(Arc::clone(&backend), 2, no_migration());
        let value = Note {
            text: "x".to_string(),
            pinned: false,
        };

        codec.encode(Some(&value)).await.unwrap();
        codec.encode(None).await.unwrap();
        assert!(backend.is_empty());

        // Clearing twice is not an error.
        codec.encode(None).await.unwrap();
    }

    // -----------------------------------------------------------------------
    // Migration
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stale_value_is_migrated_with_recorded_version() {
        let backend = Arc::new(InMemoryBackend::new());
        write_v1(&backend, "carry me", Some(1)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let migration: MigrationFn<Note> = Arc::new(move |version, loose| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(version, 1);
            let loose = loose.expect("stale bytes should arrive as loose form");
            Ok(Some(Note {
                text: loose["text"].as_str().unwrap_or_default().to_string(),
                pinned: false,
            }))
        });

        let codec = codec(backend, 2, migration);
        let back = codec.decode().await.unwrap();
        assert_eq!(
            back,
            Some(Note {
                text: "carry me".to_string(),
                pinned: false,
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_marker_migrates_from_version_zero() {
        let backend = Arc::new(InMemoryBackend::new());
        write_v1(&backend, "pre-versioning", None).await;

        let migration: MigrationFn<Note> = Arc::new(|version, _| {
            assert_eq!(version, 0);
            Ok(Some(Note {
                text: "migrated".to_string(),
                pinned: true,
            }))
        });

        let codec = codec(backend, 2, migration);
        let back = codec.decode().await.unwrap();
        assert_eq!(back.unwrap().text, "migrated");
    }

    #[tokio::test]
    async fn migration_returning_none_empties_the_store() {
        let backend = Arc::new(InMemoryBackend::new());
        write_v1(&backend, "drop me", Some(1)).await;

        let migration: MigrationFn<Note> = Arc::new(|_, _| Ok(None));
        let codec = codec(backend, 2, migration);
        assert_eq!(codec.decode().await.unwrap(), None);
    }

    #[tokio::test]
    async fn migration_failure_is_surfaced() {
        let backend = Arc::new(InMemoryBackend::new());
        write_v1(&backend, "bad", Some(1)).await;

        let migration: MigrationFn<Note> =
            Arc::new(|_, _| Err(MigrationError::new("no path from v1")));
        let codec = codec(backend, 2, migration);

        let err = codec.decode().await.unwrap_err();
        assert!(matches!(
            err,
            CodecError::Migration { from_version: 1, .. }
        ));
    }

    #[tokio::test]
    async fn migration_is_not_invoked_for_current_values() {
        let backend = Arc::new(InMemoryBackend::new());
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let migration: MigrationFn<Note> = Arc::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });

        let codec = codec(backend, 2, migration);
        let value = Note {
            text: "current".to_string(),
            pinned: true,
        };
        codec.encode(Some(&value)).await.unwrap();
        codec.decode().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_migration_lands_on_fallback() {
        let backend = Arc::new(InMemoryBackend::new());
        write_v1(&backend, "whatever", Some(1)).await;

        let fallback = Note {
            text: "fresh start".to_string(),
            pinned: false,
        };
        let codec = codec(backend, 2, migrate_to(Some(fallback.clone())));
        assert_eq!(codec.decode().await.unwrap(), Some(fallback));
    }

    // -----------------------------------------------------------------------
    // Corruption
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn bytes_unreadable_under_any_schema_are_malformed() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.write_all("note", b"\x00\x01 not json").await.unwrap();

        let codec = codec(backend, 2, no_migration());
        let err = codec.decode().await.unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[tokio::test]
    async fn bincode_payload_cannot_take_the_migration_path() {
        let backend = Arc::new(InMemoryBackend::new());
        // A v1 payload written compactly; under the current type the typed
        // parse fails, and bincode offers no loose form to migrate from.
        let bytes = bincode::serialize(&NoteV1 {
            text: "compact".to_string(),
        })
        .unwrap();
        backend.write_all("note", &bytes).await.unwrap();

        let codec: VersionedCodec<Note, BincodeSerializer> = VersionedCodec::new(
            backend,
            "note",
            2,
            Arc::new(|_, _| Ok(None)),
            BincodeSerializer::new(),
        );
        let err = codec.decode().await.unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    // -----------------------------------------------------------------------
    // Marker location override
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn marker_location_can_be_overridden() {
        let backend = Arc::new(InMemoryBackend::new());
        let codec = codec(Arc::clone(&backend), 3, no_migration())
            .with_marker_location("meta/note.schema");
        let value = Note {
            text: "x".to_string(),
            pinned: false,
        };

        codec.encode(Some(&value)).await.unwrap();
        assert_eq!(backend.read_all("meta/note.schema").await.unwrap(), b"3");
        assert!(!backend.exists("note.version").await.unwrap());
    }
}
