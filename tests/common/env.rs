//! Fully wired registry and download manager for end-to-end tests.

use std::sync::Arc;

use docs_manager::document_store::DocumentRegistry;
use docs_manager::download_manager::{DownloadManager, DownloadSettings};
use docs_manager::media::{FsBlobStore, HtmlTextProcessor};
use docs_manager::transport::HttpTransport;
use tempfile::TempDir;

use super::backend::TestBackend;
use super::fixtures::sample_documents;
use super::mocks::FakeAudioDecoder;

pub struct TestEnv {
    pub registry: Arc<DocumentRegistry>,
    pub manager: DownloadManager,
    pub decoder: Arc<FakeAudioDecoder>,
    pub media_dir: TempDir,
    pub downloads_dir: TempDir,
}

impl TestEnv {
    /// Build an environment against `backend` with all sample documents ingested.
    pub fn new(backend: &TestBackend, native_opus: bool, decoder_fails: bool) -> Self {
        Self::with_settings(backend, native_opus, decoder_fails, DownloadSettings::default())
    }

    pub fn with_settings(
        backend: &TestBackend,
        native_opus: bool,
        decoder_fails: bool,
        settings: DownloadSettings,
    ) -> Self {
        let media_dir = TempDir::new().unwrap();
        let downloads_dir = TempDir::new().unwrap();

        let registry = Arc::new(DocumentRegistry::new(Arc::new(HtmlTextProcessor)));
        for raw in sample_documents() {
            registry.upsert(raw, None);
        }

        let transport =
            Arc::new(HttpTransport::new(&backend.base_url, 5, downloads_dir.path()).unwrap());
        let blob_store = Arc::new(FsBlobStore::new(media_dir.path()));
        let decoder = Arc::new(FakeAudioDecoder::new(native_opus, decoder_fails));
        let manager = DownloadManager::new(
            registry.clone(),
            transport,
            blob_store,
            decoder.clone(),
            settings,
        );

        Self {
            registry,
            manager,
            decoder,
            media_dir,
            downloads_dir,
        }
    }
}
