//! HTTP client for the file backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{Transport, TransportError};
use crate::location::AddressDescriptor;

const FALLBACK_FILE_NAME: &str = "download";

/// Strip anything that could make `file_name` escape the target directory.
fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

/// HTTP transport fetching files from `{base_url}/file/{route}/{id}`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    downloads_dir: PathBuf,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the file backend (e.g., "http://localhost:8080")
    /// * `timeout_sec` - Request timeout in seconds
    /// * `downloads_dir` - Directory `fetch_to_disk` writes into
    pub fn new(
        base_url: &str,
        timeout_sec: u64,
        downloads_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            downloads_dir: downloads_dir.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// URL a descriptor is fetched from.
    pub fn request_url(&self, address: &AddressDescriptor) -> String {
        let location = &address.location;
        let mut url = format!(
            "{}/file/{}/{}?access_hash={}&file_reference={}&size={}",
            self.base_url,
            address.route_id,
            urlencoding::encode(&location.id),
            urlencoding::encode(&location.access_hash),
            URL_SAFE_NO_PAD.encode(&location.file_reference),
            address.size,
        );
        if let Some(thumb_size) = &location.thumb_size {
            url.push_str("&thumb_size=");
            url.push_str(&urlencoding::encode(thumb_size));
        }
        url
    }

    async fn send(&self, address: &AddressDescriptor) -> Result<reqwest::Response, TransportError> {
        let url = self.request_url(address);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, address: &AddressDescriptor) -> Result<Bytes, TransportError> {
        let response = self.send(address).await?;
        let bytes = response.bytes().await?;
        debug!(
            "Fetched {:#} for document {}",
            byte_unit::Byte::from(bytes.len() as u64),
            address.location.id
        );
        Ok(bytes)
    }

    async fn fetch_to_disk(
        &self,
        address: &AddressDescriptor,
        file_name: &str,
    ) -> Result<PathBuf, TransportError> {
        let response = self.send(address).await?;

        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        let dest = self.downloads_dir.join(sanitize_file_name(file_name));
        let mut file = File::create(&dest).await?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {:#} to {:?}", byte_unit::Byte::from(written), dest);
        Ok(dest)
    }
}
