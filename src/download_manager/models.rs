//! Data models for the download manager.
//!
//! Defines download states, errors, handles and status summaries.

use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use thiserror::Error;

use crate::location::CacheKey;
use crate::media::DecodeError;
use crate::transport::TransportError;

/// Errors delivered to download callers.
///
/// Cloneable so a single failure can be handed to every waiter of a key.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("Document {0} is empty and cannot be downloaded")]
    EmptyDocument(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Download task aborted: {0}")]
    Aborted(String),
}

/// State of a download handle.
#[derive(Debug, Clone)]
pub enum DownloadState {
    Pending,
    Completed, // terminal
    Failed(DownloadError), // terminal
}

impl DownloadState {
    /// Returns true if this is a terminal state (Completed or Failed).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadState::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::Pending => "pending",
            DownloadState::Completed => "completed",
            DownloadState::Failed(_) => "failed",
        }
    }
}

/// Payload of a finished download.
#[derive(Debug, Clone)]
pub struct DownloadedBlob {
    pub key: CacheKey,
    pub bytes: Bytes,
    /// URL the document is reachable at after the download.
    pub url: String,
}

pub(crate) type SharedDownload = Shared<BoxFuture<'static, Result<DownloadedBlob, DownloadError>>>;

/// Handle to one download, shared by every caller requesting the same key.
#[derive(Clone)]
pub struct DownloadHandle {
    key: CacheKey,
    state: Arc<Mutex<DownloadState>>,
    result: SharedDownload,
    started_at: DateTime<Utc>,
}

impl DownloadHandle {
    pub(crate) fn new(
        key: CacheKey,
        state: Arc<Mutex<DownloadState>>,
        result: SharedDownload,
    ) -> Self {
        Self {
            key,
            state,
            result,
            started_at: Utc::now(),
        }
    }

    /// Wait for the download to finish.
    ///
    /// Dropping the returned future does not cancel the download.
    pub async fn wait(&self) -> Result<DownloadedBlob, DownloadError> {
        self.result.clone().await
    }

    pub fn state(&self) -> DownloadState {
        self.state.lock().unwrap().clone()
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns true if both handles observe the same underlying download.
    pub fn is_same(&self, other: &DownloadHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("key", &self.key)
            .field("state", &self.state())
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Download manager settings.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Start a fresh attempt when a key whose download failed is requested again.
    pub retry_failed: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self { retry_failed: true }
    }
}

/// Number of known downloads per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadManagerStatus {
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}
