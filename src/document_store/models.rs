//! Data models for the document store.
//!
//! Raw records mirror the remote protocol payloads (tagged with `_`), while
//! [`Document`] is the canonical, normalized entity kept by the registry.

use serde::{Deserialize, Serialize};

/// Which protocol variant a raw document was delivered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentVariant {
    #[default]
    #[serde(rename = "document")]
    Document,
    /// Sentinel for a document that no longer exists upstream.
    #[serde(rename = "documentEmpty")]
    Empty,
}

/// Normalized playback/rendering classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    Generic,
    PhotoSizeDoc,
    Gif,
    Video,
    Round,
    Audio,
    Voice,
    Sticker,
    /// Animated sticker with its format version.
    AnimatedSticker(u8),
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Generic => "generic",
            DocumentKind::PhotoSizeDoc => "photo_size_doc",
            DocumentKind::Gif => "gif",
            DocumentKind::Video => "video",
            DocumentKind::Round => "round",
            DocumentKind::Audio => "audio",
            DocumentKind::Voice => "voice",
            DocumentKind::Sticker => "sticker",
            DocumentKind::AnimatedSticker(_) => "animated_sticker",
        }
    }

    /// Mime type assigned when the upstream payload carried none.
    pub fn default_mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Gif | DocumentKind::Video | DocumentKind::Round => "video/mp4",
            DocumentKind::Sticker => "image/webp",
            DocumentKind::Audio => "audio/mpeg",
            DocumentKind::Voice => "audio/ogg",
            _ => "application/octet-stream",
        }
    }
}

/// A thumbnail (photo size) attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Size tag, e.g. "s", "m", "i" for inline stripped previews.
    #[serde(rename = "type")]
    pub size_type: String,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    /// Byte length of the remote thumbnail file.
    #[serde(default)]
    pub size: Option<u64>,
    /// Inline preview bytes delivered with the metadata.
    #[serde(default)]
    pub bytes: Option<Vec<u8>>,
}

impl Thumbnail {
    pub fn has_inline_bytes(&self) -> bool {
        self.bytes.as_ref().is_some_and(|b| !b.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFlags {
    pub voice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFlags {
    pub round_message: bool,
    pub supports_streaming: bool,
}

/// Reference to the sticker set a sticker belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_")]
pub enum InputStickerSet {
    #[serde(rename = "inputStickerSetEmpty")]
    Empty,
    #[serde(rename = "inputStickerSetID")]
    Id { id: String, access_hash: String },
    #[serde(rename = "inputStickerSetShortName")]
    ShortName { short_name: String },
    #[serde(other)]
    Unknown,
}

impl InputStickerSet {
    /// Returns true if this reference actually points to a set.
    pub fn is_addressable(&self) -> bool {
        matches!(
            self,
            InputStickerSet::Id { .. } | InputStickerSet::ShortName { .. }
        )
    }
}

/// A raw attribute record as delivered by the remote protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_")]
pub enum RawAttribute {
    #[serde(rename = "documentAttributeFilename")]
    Filename { file_name: String },

    #[serde(rename = "documentAttributeAudio")]
    Audio {
        #[serde(default)]
        duration: u32,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        performer: Option<String>,
        #[serde(rename = "pFlags", default)]
        flags: AudioFlags,
    },

    #[serde(rename = "documentAttributeVideo")]
    Video {
        #[serde(default)]
        duration: u32,
        #[serde(default)]
        w: u32,
        #[serde(default)]
        h: u32,
        #[serde(rename = "pFlags", default)]
        flags: VideoFlags,
    },

    #[serde(rename = "documentAttributeSticker")]
    Sticker {
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        stickerset: Option<InputStickerSet>,
    },

    #[serde(rename = "documentAttributeImageSize")]
    ImageSize { w: u32, h: u32 },

    #[serde(rename = "documentAttributeAnimated")]
    Animated,

    /// Attribute kinds this crate does not know about. Ignored by the classifier.
    #[serde(other)]
    Unknown,
}

/// A raw document record as delivered by the remote protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(rename = "_", default)]
    pub variant: DocumentVariant,
    pub id: String,
    #[serde(default)]
    pub access_hash: String,
    #[serde(default)]
    pub file_reference: Vec<u8>,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub thumbs: Option<Vec<Thumbnail>>,
    /// Route (data center) serving the file.
    #[serde(default)]
    pub dc_id: i32,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

impl RawDocument {
    /// Create the explicit empty-document sentinel for an id.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            variant: DocumentVariant::Empty,
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Caller-supplied overrides applied to a raw document before it is classified.
///
/// Only honored the first time an id is seen.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    pub mime_type: Option<String>,
    /// Used when no filename attribute is present.
    pub file_name: Option<String>,
    pub route_id: Option<i32>,
    pub thumbnails: Option<Vec<Thumbnail>>,
    /// Initial kind before the attribute scan; attribute rules still override it.
    pub kind_hint: Option<DocumentKind>,
}

/// Sticker encoding, exposed as the numeric marker used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StickerFormat {
    Raster = 1,
    Vector = 2,
}

impl StickerFormat {
    pub fn marker(&self) -> u8 {
        *self as u8
    }
}

/// Sticker-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StickerInfo {
    pub format: Option<StickerFormat>,
    pub emoji_raw: Option<String>,
    /// Display-ready emoji fragment.
    pub emoji: Option<String>,
    pub sticker_set: Option<InputStickerSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AudioMeta {
    pub title: Option<String>,
    pub performer: Option<String>,
}

/// The canonical document entity, one per id.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub variant: DocumentVariant,
    pub access_hash: String,
    #[serde(skip)]
    pub file_reference: Vec<u8>,
    pub route_id: i32,
    pub date: Option<i64>,
    pub mime_type: String,
    pub kind: DocumentKind,
    pub size: u64,
    pub duration: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_name: String,
    pub thumbnails: Vec<Thumbnail>,
    pub audio: Option<AudioMeta>,
    pub sticker: Option<StickerInfo>,
    pub animated: bool,
    pub supports_streaming: bool,
    pub downloaded: bool,
    /// Current best URL for the document bytes.
    pub access_url: String,
}

impl Document {
    pub fn is_empty_document(&self) -> bool {
        self.variant == DocumentVariant::Empty
    }

    /// Sticker marker (1 raster, 2 vector), if this is a sticker.
    pub fn sticker_marker(&self) -> Option<u8> {
        self.sticker
            .as_ref()
            .and_then(|s| s.format)
            .map(|f| f.marker())
    }

    pub fn is_sticker(&self) -> bool {
        self.sticker_marker().is_some()
    }
}
