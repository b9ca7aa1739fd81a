//! Direct codec: the value at one location, no versioning.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use datum_backend::{BackendError, StorageBackend};

use crate::error::{CodecError, CodecResult};
use crate::serialize::Serializer;
use crate::traits::Codec;

/// Codec that stores the serialized value directly at one location.
///
/// Absence of the location decodes as "no value". Bytes that fail to parse
/// as the target type are malformed; there is no repair path here (see
/// [`VersionedCodec`](crate::versioned::VersionedCodec) for one).
pub struct PlainCodec<S> {
    backend: Arc<dyn StorageBackend>,
    location: String,
    serializer: S,
}

impl<S> PlainCodec<S> {
    /// Bind a codec to `location` on `backend`.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        location: impl Into<String>,
        serializer: S,
    ) -> Self {
        Self {
            backend,
            location: location.into(),
            serializer,
        }
    }

    /// The location this codec is bound to.
    pub fn location(&self) -> &str {
        &self.location
    }
}

#[async_trait]
impl<T, S> Codec<T> for PlainCodec<S>
where
    T: Send + Sync,
    S: Serializer<T>,
{
    async fn decode(&self) -> CodecResult<Option<T>> {
        let bytes = match self.backend.read_all(&self.location).await {
            Ok(bytes) => bytes,
            Err(BackendError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = self
            .serializer
            .from_bytes(&bytes)
            .map_err(|source| CodecError::Malformed {
                location: self.location.clone(),
                source,
            })?;
        Ok(Some(value))
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
                self.backend.write_all(&self.location, &bytes).await?;
                debug!(location = %self.location, len = bytes.len(), "encoded value");
            }
            None => {
                self.backend.delete(&self.location).await?;
                debug!(location = %self.location, "cleared value");
            }
        }
        Ok(())
    }
}
