//! services/app/src/adapters/blob.rs
//!
//! Out-of-line storage for image payloads too large to keep in a row.
//! Each payload is one file named after the outfit id inside a single directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use bytes::Bytes;
use clothesline_core::ports::{PortError, PortResult};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the blob directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Writes the payload and returns the name to store in the outfit row.
    pub async fn write(&self, outfit_id: Uuid, data: &[u8]) -> PortResult<String> {
        let name = format!("{}.img", outfit_id);
        self.ensure_dir()
            .await
            .map_err(|e| PortError::Unexpected(format!("Cannot create blob directory: {}", e)))?;
        tokio::fs::write(self.root.join(&name), data)
            .await
            .map_err(|e| PortError::Unexpected(format!("Cannot write blob {}: {}", name, e)))?;
        debug!(blob = %name, size = data.len(), "Blob written");
        Ok(name)
    }

    pub async fn read(&self, name: &str) -> PortResult<Bytes> {
        match tokio::fs::read(self.root.join(name)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PortError::NotFound(format!("Blob {} not found", name)))
            }
            Err(e) => Err(PortError::Unexpected(format!("Cannot read blob {}: {}", name, e))),
        }
    }

    /// Removes a payload. Failures are logged, a missing file is not one.
    pub async fn remove(&self, name: &str) {
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => debug!(blob = %name, "Blob removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(blob = %name, "Failed to remove blob: {}", e),
        }
    }
}
