//! Previews built from inline thumbnail bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Builds displayable previews from thumbnail bytes shipped with metadata.
pub trait PreviewDecoder: Send + Sync {
    /// Returns a URL the renderer can display directly.
    fn preview_from_bytes(&self, bytes: &[u8], is_sticker: bool) -> String;
}

/// Encodes inline bytes as a `data:` URL.
///
/// The image type is sniffed from the bytes, falling back to WebP for
/// stickers and JPEG for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePreviewDecoder;

impl InlinePreviewDecoder {
    fn mime_type(bytes: &[u8], is_sticker: bool) -> &'static str {
        match infer::get(bytes) {
            Some(kind) if kind.mime_type().starts_with("image/") => kind.mime_type(),
            _ if is_sticker => "image/webp",
            _ => "image/jpeg",
        }
    }
}

impl PreviewDecoder for InlinePreviewDecoder {
    fn preview_from_bytes(&self, bytes: &[u8], is_sticker: bool) -> String {
        format!(
            "data:{};base64,{}",
            Self::mime_type(bytes, is_sticker),
            STANDARD.encode(bytes)
        )
    }
}
