//! Download manager.
//!
//! Deduplicates document downloads by cache key. The first request for a key
//! spawns the fetch and registers its handle before returning; every later
//! request for the same key gets that handle back.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::models::{
    DownloadError, DownloadHandle, DownloadManagerStatus, DownloadSettings, DownloadState,
    DownloadedBlob,
};
use super::transcode::TranscodeFallback;
use crate::document_store::{DocumentKey, DocumentRef, DocumentRegistry};
use crate::location::{input_file_name, resolve_address, AddressDescriptor, CacheKey, Usage};
use crate::media::{AudioDecoder, BlobStore};
use crate::metrics;
use crate::transport::Transport;

/// Everything a spawned download needs, detached from the manager.
#[derive(Clone)]
struct DownloadJob {
    transport: Arc<dyn Transport>,
    blob_store: Arc<dyn BlobStore>,
    transcode: TranscodeFallback,
}

impl DownloadJob {
    async fn run(
        self,
        key: CacheKey,
        doc: DocumentRef,
        address: AddressDescriptor,
    ) -> Result<DownloadedBlob, DownloadError> {
        let bytes = self.transport.fetch(&address).await?;
        metrics::record_bytes_fetched(bytes.len());

        let (kind, supports_streaming) = {
            let doc = doc.read().unwrap();
            (doc.kind, doc.supports_streaming)
        };

        // Streaming-capable documents keep their network URL.
        let local_url = if supports_streaming {
            None
        } else {
            let url = self
                .blob_store
                .materialize(key.as_str(), bytes.clone(), &address.mime_type)
                .await
                .map_err(|e| DownloadError::Storage(e.to_string()))?;
            Some(url)
        };

        let mut url = {
            let mut doc = doc.write().unwrap();
            doc.downloaded = true;
            if let Some(local_url) = local_url {
                doc.access_url = local_url;
            }
            doc.access_url.clone()
        };

        if self.transcode.applies_to(kind) {
            let decoded = self.transcode.transcode(&doc, bytes.clone()).await?;
            url = decoded.url;
        }

        Ok(DownloadedBlob { key, bytes, url })
    }
}

/// Orchestrates document downloads.
pub struct DownloadManager {
    registry: Arc<DocumentRegistry>,
    job: DownloadJob,
    settings: DownloadSettings,
    downloads: Mutex<HashMap<CacheKey, DownloadHandle>>,
}

impl DownloadManager {
    pub fn new(
        registry: Arc<DocumentRegistry>,
        transport: Arc<dyn Transport>,
        blob_store: Arc<dyn BlobStore>,
        audio_decoder: Arc<dyn AudioDecoder>,
        settings: DownloadSettings,
    ) -> Self {
        Self {
            registry,
            job: DownloadJob {
                transport,
                blob_store,
                transcode: TranscodeFallback::new(audio_decoder),
            },
            settings,
            downloads: Mutex::new(HashMap::new()),
        }
    }

    fn resolve(&self, key: impl Into<DocumentKey>) -> Result<DocumentRef, DownloadError> {
        let key = key.into();
        let missing = match &key {
            DocumentKey::Id(id) => id.clone(),
            DocumentKey::Entity(_) => String::new(),
        };
        self.registry
            .get(key)
            .ok_or(DownloadError::DocumentNotFound(missing))
    }

    // =========================================================================
    // Downloads
    // =========================================================================

    /// Request the full download of a document.
    ///
    /// Must be called within a tokio runtime. Returns the existing handle when
    /// the document's cache key was already requested; a failed key is retried
    /// unless `retry_failed` is off.
    pub fn request_download(
        &self,
        doc: impl Into<DocumentKey>,
    ) -> Result<DownloadHandle, DownloadError> {
        let doc = self.resolve(doc)?;

        let (key, address) = {
            let d = doc.read().unwrap();
            if d.is_empty_document() {
                return Err(DownloadError::EmptyDocument(d.id.clone()));
            }
            (input_file_name(&d, None), resolve_address(&d, Usage::Default))
        };

        let mut downloads = self.downloads.lock().unwrap();

        if let Some(existing) = downloads.get(&key) {
            let failed = matches!(existing.state(), DownloadState::Failed(_));
            if !failed || !self.settings.retry_failed {
                debug!("Reusing {} download for {}", existing.state().as_str(), key);
                metrics::record_download("deduplicated");
                return Ok(existing.clone());
            }
            info!("Retrying failed download {}", key);
        }

        let handle = self.start_download(key.clone(), doc, address);
        downloads.insert(key, handle.clone());
        Ok(handle)
    }

    fn start_download(
        &self,
        key: CacheKey,
        doc: DocumentRef,
        address: AddressDescriptor,
    ) -> DownloadHandle {
        info!(
            "Starting download {} ({:#})",
            key,
            byte_unit::Byte::from(address.size)
        );
        metrics::record_download("started");

        let state = Arc::new(Mutex::new(DownloadState::Pending));
        let job = self.job.clone();
        let task_state = state.clone();
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            // A panic inside the job still has to settle the handle's state.
            let result = match AssertUnwindSafe(job.run(task_key.clone(), doc, address))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(&*panic);
                    error!("Download {} panicked: {}", task_key, message);
                    Err(DownloadError::Aborted(message))
                }
            };

            let outcome = match &result {
                Ok(blob) => {
                    info!(
                        "Download {} completed ({:#})",
                        task_key,
                        byte_unit::Byte::from(blob.bytes.len() as u64)
                    );
                    *task_state.lock().unwrap() = DownloadState::Completed;
                    "completed"
                }
                Err(e) => {
                    warn!("Download {} failed: {}", task_key, e);
                    *task_state.lock().unwrap() = DownloadState::Failed(e.clone());
                    "failed"
                }
            };
            metrics::record_download(outcome);
            metrics::record_download_duration(outcome, started.elapsed());

            result
        });

        let abort_state = state.clone();
        let result = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Download task aborted: {}", e);
                    let err = DownloadError::Aborted(e.to_string());
                    *abort_state.lock().unwrap() = DownloadState::Failed(err.clone());
                    Err(err)
                }
            }
        }
        .boxed()
        .shared();

        DownloadHandle::new(key, state, result)
    }

    /// Fetch a document straight to disk.
    ///
    /// Independent of the dedup cache: every call issues its own fetch.
    pub async fn save_to_disk(
        &self,
        doc: impl Into<DocumentKey>,
    ) -> Result<PathBuf, DownloadError> {
        let doc = self.resolve(doc)?;

        let (address, file_name) = {
            let d = doc.read().unwrap();
            if d.is_empty_document() {
                return Err(DownloadError::EmptyDocument(d.id.clone()));
            }
            let file_name = if d.file_name.is_empty() {
                input_file_name(&d, None).to_string()
            } else {
                d.file_name.clone()
            };
            (resolve_address(&d, Usage::Download), file_name)
        };

        let path = self.job.transport.fetch_to_disk(&address, &file_name).await?;
        info!("Saved document {} to {:?}", address.location.id, path);
        Ok(path)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Handle registered for a cache key, if any.
    pub fn get_download(&self, key: &CacheKey) -> Option<DownloadHandle> {
        self.downloads.lock().unwrap().get(key).cloned()
    }

    /// Cache key a document's download is registered under.
    pub fn download_key(&self, doc: impl Into<DocumentKey>) -> Result<CacheKey, DownloadError> {
        let doc = self.resolve(doc)?;
        let d = doc.read().unwrap();
        Ok(input_file_name(&d, None))
    }

    pub fn get_status(&self) -> DownloadManagerStatus {
        let downloads = self.downloads.lock().unwrap();
        let mut status = DownloadManagerStatus::default();
        for handle in downloads.values() {
            match handle.state() {
                DownloadState::Pending => status.pending += 1,
                DownloadState::Completed => status.completed += 1,
                DownloadState::Failed(_) => status.failed += 1,
            }
        }
        status
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "download task panicked".to_string()
    }
}
