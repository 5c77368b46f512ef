//! Attribute classification.
//!
//! Turns the raw attribute list of a document into its normalized kind,
//! dimensions, duration and file name. Rules are applied in attribute order
//! and later matches override the kind chosen by earlier ones.

use crate::media::{RichTextOptions, RichTextProcessor};

use super::models::{
    AudioMeta, DocumentKind, DocumentVariant, RawAttribute, StickerFormat, StickerInfo,
};

/// GIFs above this size are streamed instead of materialized.
pub const GIF_STREAMING_THRESHOLD_BYTES: u64 = 8_000_000;

/// Mime type of vector (Lottie) animated stickers.
pub const VECTOR_STICKER_MIME: &str = "application/x-tgsticker";

/// File name the upstream assigns to vector animated stickers.
pub const VECTOR_STICKER_FILE_NAME: &str = "AnimatedSticker.tgs";

const VOICE_MIME: &str = "audio/ogg";
const RASTER_STICKER_MIME: &str = "image/webp";
const GIF_MIMES: &[&str] = &["image/gif", "video/mp4"];

/// Everything the classifier needs to know about a document.
#[derive(Debug, Clone)]
pub struct ClassificationInput<'a> {
    pub attributes: &'a [RawAttribute],
    /// Mime type delivered upstream (or from the caller context).
    pub mime_type: Option<&'a str>,
    pub size: u64,
    pub variant: DocumentVariant,
    /// Kind before the attribute scan.
    pub initial_kind: DocumentKind,
    /// File name before the attribute scan.
    pub initial_file_name: Option<&'a str>,
}

/// Result of classifying a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: DocumentKind,
    pub mime_type: String,
    pub file_name: String,
    pub size: u64,
    pub duration: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub audio: Option<AudioMeta>,
    pub sticker: Option<StickerInfo>,
    pub animated: bool,
    pub supports_streaming: bool,
}

/// Returns true if a document of this kind and size is consumed incrementally.
pub fn supports_streaming(kind: DocumentKind, size: u64) -> bool {
    matches!(kind, DocumentKind::Audio | DocumentKind::Video)
        || (kind == DocumentKind::Gif && size > GIF_STREAMING_THRESHOLD_BYTES)
}

/// Classify a document from its attributes.
///
/// Never fails: unknown attributes are skipped.
pub fn classify(input: &ClassificationInput<'_>, text: &dyn RichTextProcessor) -> Classification {
    // An empty string from upstream counts as "no mime type".
    let upstream_mime = input.mime_type.filter(|m| !m.is_empty());

    let mut kind = input.initial_kind;
    let mut file_name = input.initial_file_name.map(str::to_string);
    let mut duration = None;
    let mut width = None;
    let mut height = None;
    let mut audio = None;
    let mut sticker: Option<StickerInfo> = None;
    let mut animated = false;

    for attribute in input.attributes {
        match attribute {
            RawAttribute::Filename { file_name: name } => {
                file_name = Some(text.wrap_plain_text(name));
            }

            RawAttribute::Audio {
                duration: d,
                title,
                performer,
                flags,
            } => {
                duration = Some(*d);
                audio = Some(AudioMeta {
                    title: title.clone(),
                    performer: performer.clone(),
                });
                kind = if flags.voice && upstream_mime == Some(VOICE_MIME) {
                    DocumentKind::Voice
                } else {
                    DocumentKind::Audio
                };
            }

            RawAttribute::Video {
                duration: d,
                w,
                h,
                flags,
            } => {
                duration = Some(*d);
                width = Some(*w);
                height = Some(*h);
                kind = if flags.round_message {
                    DocumentKind::Round
                } else {
                    DocumentKind::Video
                };
            }

            RawAttribute::Sticker { alt, stickerset } => {
                let info = sticker.get_or_insert_with(StickerInfo::default);

                if let Some(alt) = alt {
                    info.emoji_raw = Some(alt.clone());
                    info.emoji = Some(text.wrap_rich_text(
                        alt,
                        RichTextOptions {
                            no_links: true,
                            no_linebreaks: true,
                        },
                    ));
                }

                if let Some(set) = stickerset.as_ref().filter(|s| s.is_addressable()) {
                    info.sticker_set = Some(set.clone());
                }

                if upstream_mime == Some(RASTER_STICKER_MIME) {
                    kind = DocumentKind::Sticker;
                    info.format = Some(StickerFormat::Raster);
                }
            }

            RawAttribute::ImageSize { w, h } => {
                width = Some(*w);
                height = Some(*h);
            }

            RawAttribute::Animated => {
                if upstream_mime.is_some_and(|m| GIF_MIMES.contains(&m)) {
                    kind = DocumentKind::Gif;
                }
                animated = true;
            }

            RawAttribute::Unknown => {}
        }
    }

    let mime_type = upstream_mime
        .map(str::to_string)
        .unwrap_or_else(|| kind.default_mime_type().to_string());

    let supports_streaming = supports_streaming(kind, input.size);

    let file_name = file_name.unwrap_or_default();

    if mime_type == VECTOR_STICKER_MIME && file_name == VECTOR_STICKER_FILE_NAME {
        kind = DocumentKind::Sticker;
        animated = true;
        sticker.get_or_insert_with(StickerInfo::default).format = Some(StickerFormat::Vector);
    }

    let size = match input.variant {
        DocumentVariant::Empty => 0,
        DocumentVariant::Document => input.size,
    };

    Classification {
        kind,
        mime_type,
        file_name,
        size,
        duration,
        width,
        height,
        audio,
        sticker,
        animated,
        supports_streaming,
    }
}
