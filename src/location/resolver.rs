//! Address and URL resolution for documents.
//!
//! Derives what to ask the transport for (an [`AddressDescriptor`]), which
//! access mode a usage maps to, and the cache key that identifies a fetch.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::document_store::{Document, Thumbnail};
use crate::media::PreviewDecoder;

const THUMB_MIME: &str = "image/jpeg";
const STICKER_THUMB_MIME: &str = "image/webp";
const FALLBACK_MIME: &str = "application/octet-stream";

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
}

/// Location of a document file (or one of its thumbnails) on the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFileLocation {
    pub id: String,
    pub access_hash: String,
    #[serde(serialize_with = "serialize_base64")]
    pub file_reference: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_size: Option<String>,
}

/// Reference used to attach an existing document to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputMediaDocument {
    pub id: String,
    pub access_hash: String,
    #[serde(serialize_with = "serialize_base64")]
    pub file_reference: Vec<u8>,
    pub ttl_seconds: u32,
}

/// Everything the transport needs to fetch one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressDescriptor {
    pub route_id: i32,
    pub location: InputFileLocation,
    pub size: u64,
    pub mime_type: String,
    pub file_name: String,
}

/// What a document is being resolved for.
#[derive(Debug, Clone, Copy)]
pub enum Usage<'a> {
    /// Regular access (stream or whole document).
    Default,
    /// Forced full download.
    Download,
    Thumbnail(&'a Thumbnail),
}

/// How the document bytes will be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Download,
    Thumb,
    Stream,
    Document,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Download => "download",
            AccessMode::Thumb => "thumb",
            AccessMode::Stream => "stream",
            AccessMode::Document => "document",
        }
    }
}

/// Preview of a document thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailPreview {
    /// Built from bytes shipped with the metadata.
    Inline(String),
    /// Has to be fetched from the network.
    Remote(String),
}

impl ThumbnailPreview {
    pub fn url(&self) -> &str {
        match self {
            ThumbnailPreview::Inline(url) | ThumbnailPreview::Remote(url) => url,
        }
    }
}

/// Deterministic key identifying one fetchable file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey(key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the file location of a document, optionally for a thumbnail size.
pub fn input_location(doc: &Document, thumb_size: Option<&str>) -> InputFileLocation {
    InputFileLocation {
        id: doc.id.clone(),
        access_hash: doc.access_hash.clone(),
        file_reference: doc.file_reference.clone(),
        thumb_size: thumb_size.map(str::to_string),
    }
}

/// Build the media reference used to re-send a document.
pub fn media_input(doc: &Document) -> InputMediaDocument {
    InputMediaDocument {
        id: doc.id.clone(),
        access_hash: doc.access_hash.clone(),
        file_reference: doc.file_reference.clone(),
        ttl_seconds: 0,
    }
}

/// Pick the access mode: download, then thumbnail, then stream, then document.
pub fn choose_access_mode(doc: &Document, download: bool, thumb: Option<&Thumbnail>) -> AccessMode {
    if download {
        AccessMode::Download
    } else if thumb.is_some() {
        AccessMode::Thumb
    } else if doc.supports_streaming {
        AccessMode::Stream
    } else {
        AccessMode::Document
    }
}

/// Build the address descriptor for a usage.
///
/// Thumbnails are always raster previews, so their mime type ignores the
/// document's own.
pub fn resolve_address(doc: &Document, usage: Usage<'_>) -> AddressDescriptor {
    let thumb = match usage {
        Usage::Thumbnail(thumb) => Some(thumb),
        Usage::Default | Usage::Download => None,
    };

    let (size, mime_type) = match thumb {
        Some(thumb) => {
            let mime = if doc.is_sticker() {
                STICKER_THUMB_MIME
            } else {
                THUMB_MIME
            };
            (thumb.size.unwrap_or(0), mime.to_string())
        }
        None => {
            let mime = if doc.mime_type.is_empty() {
                FALLBACK_MIME.to_string()
            } else {
                doc.mime_type.clone()
            };
            (doc.size, mime)
        }
    };

    AddressDescriptor {
        route_id: doc.route_id,
        location: input_location(doc, thumb.map(|t| t.size_type.as_str())),
        size,
        mime_type,
        file_name: doc.file_name.clone(),
    }
}

/// Network URL for a document: `{mode}/{url-encoded JSON descriptor}`.
pub fn file_url(doc: &Document, download: bool, thumb: Option<&Thumbnail>) -> String {
    let mode = choose_access_mode(doc, download, thumb);
    let usage = match (download, thumb) {
        (true, _) => Usage::Download,
        (false, Some(thumb)) => Usage::Thumbnail(thumb),
        (false, None) => Usage::Default,
    };
    let address = resolve_address(doc, usage);
    let json = serde_json::to_string(&address).unwrap_or_default();
    format!("{}/{}", mode.as_str(), urlencoding::encode(&json))
}

/// Resolve the preview for a document's thumbnail.
///
/// With `prefer_inline_bytes` unset, the first thumbnail without inline bytes
/// is chosen; otherwise (or if there is none) the first thumbnail is used.
/// Returns `None` when the document has no thumbnails.
pub fn resolve_thumbnail(
    doc: &Document,
    prefer_inline_bytes: bool,
    decoder: &dyn PreviewDecoder,
) -> Option<ThumbnailPreview> {
    let remote_first = if prefer_inline_bytes {
        None
    } else {
        doc.thumbnails.iter().find(|t| !t.has_inline_bytes())
    };
    let thumb = remote_first.or_else(|| doc.thumbnails.first())?;

    match thumb.bytes.as_deref() {
        Some(bytes) if !bytes.is_empty() => Some(ThumbnailPreview::Inline(
            decoder.preview_from_bytes(bytes, doc.is_sticker()),
        )),
        _ => Some(ThumbnailPreview::Remote(file_url(doc, false, Some(thumb)))),
    }
}

/// File extension for an address, from the file name or the mime type.
///
/// Thumbnail addresses only use the mime type, since the file name belongs to
/// the document.
fn extension(address: &AddressDescriptor) -> &str {
    let from_name = Some(address.file_name.as_str())
        .filter(|_| address.location.thumb_size.is_none())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    if let Some(ext) = from_name {
        return ext;
    }

    match address.mime_type.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "audio/ogg" => "ogg",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "application/pdf" => "pdf",
        "application/x-tgsticker" => "tgs",
        _ => "",
    }
}

/// Derive the cache key of an address.
///
/// Format: `{route}_{id}[_{thumb}]_{digest}[.{ext}]`, where the digest covers
/// the file reference, size, mime type and file name.
pub fn cache_key(address: &AddressDescriptor) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(&address.location.file_reference);
    hasher.update(address.size.to_le_bytes());
    hasher.update(address.mime_type.as_bytes());
    hasher.update([0u8]);
    hasher.update(address.file_name.as_bytes());
    let digest: String = hasher.finalize()[..8]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();

    let mut key = format!("{}_{}", address.route_id, address.location.id);
    if let Some(thumb_size) = &address.location.thumb_size {
        key.push('_');
        key.push_str(thumb_size);
    }
    key.push('_');
    key.push_str(&digest);

    let ext = extension(address);
    if !ext.is_empty() {
        key.push('.');
        key.push_str(&ext.to_ascii_lowercase());
    }

    CacheKey(key)
}

/// Cache key of a document's default address, optionally for a thumbnail.
pub fn input_file_name(doc: &Document, thumb: Option<&Thumbnail>) -> CacheKey {
    let usage = match thumb {
        Some(thumb) => Usage::Thumbnail(thumb),
        None => Usage::Default,
    };
    cache_key(&resolve_address(doc, usage))
}
