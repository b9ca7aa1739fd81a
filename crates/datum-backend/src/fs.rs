//! Filesystem-backed storage.
//!
//! Locations are interpreted as paths. Writes are staged in a temporary
//! file next to the destination and published with a rename, so a reader
//! never observes a partially written value even if the process dies
//! mid-write.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::traits::StorageBackend;

/// Storage backend over the local filesystem.
///
/// Missing parent directories are created on write. Reading a missing path
/// yields `NotFound`; deleting one succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsBackend;

impl FsBackend {
    /// Create a new filesystem backend.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn exists(&self, location: &str) -> BackendResult<bool> {
        Ok(tokio::fs::try_exists(location).await?)
    }

    async fn read_all(&self, location: &str) -> BackendResult<Vec<u8>> {
        match tokio::fs::read(location).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BackendError::NotFound {
                location: location.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, location: &str, bytes: &[u8]) -> BackendResult<()> {
        let path = PathBuf::from(location);
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        let len = bytes.len();
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            // Stage in the destination directory so the rename cannot cross
            // filesystems.
            let mut tmp = NamedTempFile::new_in(&parent)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(location, len, "replaced location contents");
        Ok(())
    }

    async fn delete(&self, location: &str) -> BackendResult<()> {
        match tokio::fs::remove_file(location).await {
            Ok(()) => {
                debug!(location, "deleted location");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
