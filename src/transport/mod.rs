//! Byte transport for document files.

mod http_client;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::location::AddressDescriptor;

pub use http_client::HttpTransport;

/// Errors surfaced by a transport. Cloneable so one failure can reach every waiter.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Transport not configured")]
    NotConfigured,
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}

/// Fetches document bytes addressed by an [`AddressDescriptor`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the whole file into memory.
    async fn fetch(&self, address: &AddressDescriptor) -> Result<Bytes, TransportError>;

    /// Fetch the file and write it to disk under `file_name`.
    ///
    /// Returns the path written.
    async fn fetch_to_disk(
        &self,
        address: &AddressDescriptor,
        file_name: &str,
    ) -> Result<PathBuf, TransportError>;
}

/// Transport used when no backend URL is configured. Every call fails.
pub struct UnconfiguredTransport;

#[async_trait]
impl Transport for UnconfiguredTransport {
    async fn fetch(&self, _address: &AddressDescriptor) -> Result<Bytes, TransportError> {
        Err(TransportError::NotConfigured)
    }

    async fn fetch_to_disk(
        &self,
        _address: &AddressDescriptor,
        _file_name: &str,
    ) -> Result<PathBuf, TransportError> {
        Err(TransportError::NotConfigured)
    }
}
