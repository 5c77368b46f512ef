//! Media collaborators used by the document store and the download manager.
//!
//! Text sanitization, inline previews, audio decoding and local blob storage.

mod audio;
mod blob_store;
mod preview;
mod rich_text;

pub use audio::{AudioDecoder, DecodeError, DecodedAudio, FfmpegAudioDecoder, DECODED_AUDIO_MIME};
pub use blob_store::{BlobStore, BlobStoreError, FsBlobStore, MemoryBlobStore};
pub use preview::{InlinePreviewDecoder, PreviewDecoder};
pub use rich_text::{HtmlTextProcessor, RichTextOptions, RichTextProcessor};
