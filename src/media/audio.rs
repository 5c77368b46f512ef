//! Audio decoding for containers the playback runtime cannot handle.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::blob_store::BlobStore;

/// Mime type of decoded output.
pub const DECODED_AUDIO_MIME: &str = "audio/wav";

/// Errors that can occur while decoding audio.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("Nothing to decode")]
    EmptyInput,

    #[error("Decoder failed: {0}")]
    DecoderFailed(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to store decoded audio: {0}")]
    Storage(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        DecodeError::Io(e.to_string())
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Local URL of the playable output.
    pub url: String,
    pub mime_type: String,
    pub len: usize,
}

/// Decoder for voice notes.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Whether the playback runtime handles Ogg/Opus by itself.
    fn can_play_natively(&self) -> bool;

    /// Decode a full payload into a playable format.
    async fn decode(&self, bytes: Bytes) -> Result<DecodedAudio, DecodeError>;
}

/// Decodes Ogg/Opus to WAV by piping the payload through ffmpeg.
pub struct FfmpegAudioDecoder {
    ffmpeg_path: String,
    native_playback: bool,
    blob_store: Arc<dyn BlobStore>,
}

impl FfmpegAudioDecoder {
    /// Create a new decoder.
    ///
    /// # Arguments
    /// * `ffmpeg_path` - ffmpeg executable (name on PATH or absolute path)
    /// * `native_playback` - whether the runtime already plays Ogg/Opus
    /// * `blob_store` - where decoded output is written
    pub fn new(
        ffmpeg_path: impl Into<String>,
        native_playback: bool,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            native_playback,
            blob_store,
        }
    }

    async fn run_ffmpeg(&self, bytes: Bytes) -> Result<Vec<u8>, DecodeError> {
        let mut child = Command::new(&self.ffmpeg_path)
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-f",
                "wav",
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DecodeError::Io("ffmpeg stdin unavailable".to_string()))?;

        // Feed stdin from a separate task so a full stdout pipe cannot deadlock us.
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&bytes).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await?;
        let write_result = writer
            .await
            .map_err(|e| DecodeError::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::DecoderFailed(stderr.trim().to_string()));
        }
        write_result?;

        if output.stdout.is_empty() {
            return Err(DecodeError::DecoderFailed(
                "ffmpeg produced no output".to_string(),
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl AudioDecoder for FfmpegAudioDecoder {
    fn can_play_natively(&self) -> bool {
        self.native_playback
    }

    async fn decode(&self, bytes: Bytes) -> Result<DecodedAudio, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::EmptyInput);
        }

        debug!("Decoding {} bytes with {}", bytes.len(), self.ffmpeg_path);
        let decoded = self.run_ffmpeg(bytes).await?;
        let len = decoded.len();

        let name = format!("decoded_{}.wav", uuid::Uuid::new_v4());
        let url = self
            .blob_store
            .materialize(&name, Bytes::from(decoded), DECODED_AUDIO_MIME)
            .await
            .map_err(|e| DecodeError::Storage(e.to_string()))?;

        Ok(DecodedAudio {
            url,
            mime_type: DECODED_AUDIO_MIME.to_string(),
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MemoryBlobStore;

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let decoder = FfmpegAudioDecoder::new("ffmpeg", false, Arc::new(MemoryBlobStore::new()));
        let result = decoder.decode(Bytes::new()).await;
        assert!(matches!(result, Err(DecodeError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_missing_executable_is_an_io_error() {
        let decoder = FfmpegAudioDecoder::new(
            "/nonexistent/ffmpeg-binary",
            false,
            Arc::new(MemoryBlobStore::new()),
        );
        let result = decoder.decode(Bytes::from_static(b"OggS")).await;
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[test]
    fn test_native_playback_flag() {
        let store = Arc::new(MemoryBlobStore::new());
        assert!(FfmpegAudioDecoder::new("ffmpeg", true, store.clone()).can_play_natively());
        assert!(!FfmpegAudioDecoder::new("ffmpeg", false, store).can_play_natively());
    }
}
