//! Local materialization of fetched bytes.
//!
//! A blob store turns a fetched payload into a locally addressable URL, so
//! that consumers stop hitting the network once a document is downloaded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const BLOB_URL_PREFIX: &str = "blob:";

/// Errors that can occur while materializing bytes.
#[derive(Debug, Clone, Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid blob name: {0}")]
    InvalidName(String),
}

impl From<std::io::Error> for BlobStoreError {
    fn from(e: std::io::Error) -> Self {
        BlobStoreError::Io(e.to_string())
    }
}

/// Storage for downloaded payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name` and return a local URL for them.
    async fn materialize(
        &self,
        name: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<String, BlobStoreError>;
}

/// Rejects names that would escape the store directory.
fn validate_name(name: &str) -> Result<&str, BlobStoreError> {
    let is_plain = Path::new(name)
        .file_name()
        .is_some_and(|f| f.to_str() == Some(name));
    if name.is_empty() || !is_plain || name.starts_with('.') {
        return Err(BlobStoreError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// Blob store writing files under a base directory and returning `file://` URLs.
pub struct FsBlobStore {
    base_dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path a blob with the given name is written to.
    pub fn blob_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn materialize(
        &self,
        name: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<String, BlobStoreError> {
        let name = validate_name(name)?;
        fs::create_dir_all(&self.base_dir).await?;

        let path = self.blob_path(name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        let absolute = fs::canonicalize(&path).await?;
        debug!(
            "Materialized {} ({}) at {:?}",
            name,
            mime_type,
            absolute
        );
        Ok(format!("file://{}", absolute.display()))
    }
}

#[derive(Debug, Clone)]
struct MemoryBlob {
    name: String,
    mime_type: String,
    bytes: Bytes,
}

/// Blob store keeping payloads in memory behind `blob:` URLs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, MemoryBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored behind a `blob:` URL.
    pub fn get(&self, url: &str) -> Option<Bytes> {
        self.blobs.lock().unwrap().get(url).map(|b| b.bytes.clone())
    }

    /// Mime type and original name stored behind a `blob:` URL.
    pub fn describe(&self, url: &str) -> Option<(String, String)> {
        self.blobs
            .lock()
            .unwrap()
            .get(url)
            .map(|b| (b.name.clone(), b.mime_type.clone()))
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn materialize(
        &self,
        name: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<String, BlobStoreError> {
        let url = format!("{}{}", BLOB_URL_PREFIX, uuid::Uuid::new_v4());
        self.blobs.lock().unwrap().insert(
            url.clone(),
            MemoryBlob {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                bytes,
            },
        );
        Ok(url)
    }
}
