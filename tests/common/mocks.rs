//! Fake collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use docs_manager::media::{AudioDecoder, DecodeError, DecodedAudio};

pub const DECODED_URL: &str = "blob:decoded-voice";

/// Audio decoder that never runs a real codec.
pub struct FakeAudioDecoder {
    native: bool,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeAudioDecoder {
    pub fn new(native: bool, fail: bool) -> Self {
        Self {
            native,
            fail,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioDecoder for FakeAudioDecoder {
    fn can_play_natively(&self) -> bool {
        self.native
    }

    async fn decode(&self, bytes: Bytes) -> Result<DecodedAudio, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DecodeError::DecoderFailed("unsupported opus stream".to_string()));
        }
        Ok(DecodedAudio {
            url: DECODED_URL.to_string(),
            mime_type: "audio/wav".to_string(),
            len: bytes.len(),
        })
    }
}
