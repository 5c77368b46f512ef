//! Post-download transcoding of voice notes the runtime cannot play.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use super::models::DownloadError;
use crate::document_store::{DocumentKind, DocumentRef};
use crate::media::{AudioDecoder, DecodedAudio};
use crate::metrics;

/// Decodes downloaded voice notes when native Ogg/Opus playback is missing.
#[derive(Clone)]
pub struct TranscodeFallback {
    decoder: Arc<dyn AudioDecoder>,
}

impl TranscodeFallback {
    pub fn new(decoder: Arc<dyn AudioDecoder>) -> Self {
        Self { decoder }
    }

    /// Returns true if documents of this kind must be decoded after download.
    pub fn applies_to(&self, kind: DocumentKind) -> bool {
        kind == DocumentKind::Voice && !self.decoder.can_play_natively()
    }

    /// Decode a downloaded payload and point the document at the result.
    ///
    /// On failure the document is marked as not downloaded.
    pub async fn transcode(
        &self,
        doc: &DocumentRef,
        bytes: Bytes,
    ) -> Result<DecodedAudio, DownloadError> {
        let id = doc.read().unwrap().id.clone();

        match self.decoder.decode(bytes).await {
            Ok(decoded) => {
                doc.write().unwrap().access_url = decoded.url.clone();
                metrics::record_transcode("success");
                info!(
                    "Transcoded document {} to {} ({:#})",
                    id,
                    decoded.mime_type,
                    byte_unit::Byte::from(decoded.len as u64)
                );
                Ok(decoded)
            }
            Err(e) => {
                doc.write().unwrap().downloaded = false;
                metrics::record_transcode("failure");
                warn!("Failed to transcode document {}: {}", id, e);
                Err(DownloadError::Decode(e))
            }
        }
    }
}
