//! The document registry.
//!
//! Holds one canonical [`Document`] per id. The first submission of an id is
//! classified and stored; later submissions only merge the fields listed as
//! mergeable in [`MERGE_POLICIES`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::location::file_url;
use crate::media::RichTextProcessor;
use crate::metrics;

use super::classifier::{classify, ClassificationInput};
use super::models::{Document, DocumentContext, RawDocument};

/// Shared handle to a stored document. Holders observe later updates.
pub type DocumentRef = Arc<RwLock<Document>>;

/// Either a document id or an entity already in hand.
#[derive(Debug, Clone)]
pub enum DocumentKey {
    Id(String),
    Entity(DocumentRef),
}

impl From<&str> for DocumentKey {
    fn from(id: &str) -> Self {
        DocumentKey::Id(id.to_string())
    }
}

impl From<String> for DocumentKey {
    fn from(id: String) -> Self {
        DocumentKey::Id(id)
    }
}

impl From<&String> for DocumentKey {
    fn from(id: &String) -> Self {
        DocumentKey::Id(id.clone())
    }
}

impl From<DocumentRef> for DocumentKey {
    fn from(doc: DocumentRef) -> Self {
        DocumentKey::Entity(doc)
    }
}

impl From<&DocumentRef> for DocumentKey {
    fn from(doc: &DocumentRef) -> Self {
        DocumentKey::Entity(doc.clone())
    }
}

/// How a field behaves when an already known id is submitted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keeps the value computed on first creation.
    Immutable,
    /// Always takes the newly submitted value.
    Overwrite,
    /// Takes the new value only while the stored one is empty.
    FillIfEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentField {
    Variant,
    AccessHash,
    FileReference,
    RouteId,
    Date,
    MimeType,
    Kind,
    Size,
    Duration,
    Dimensions,
    FileName,
    Thumbnails,
    Audio,
    Sticker,
    Animated,
    SupportsStreaming,
}

pub const MERGE_POLICIES: &[(DocumentField, MergePolicy)] = &[
    (DocumentField::Variant, MergePolicy::Immutable),
    (DocumentField::AccessHash, MergePolicy::Immutable),
    (DocumentField::FileReference, MergePolicy::Overwrite),
    (DocumentField::RouteId, MergePolicy::Immutable),
    (DocumentField::Date, MergePolicy::Immutable),
    (DocumentField::MimeType, MergePolicy::Immutable),
    (DocumentField::Kind, MergePolicy::Immutable),
    (DocumentField::Size, MergePolicy::Immutable),
    (DocumentField::Duration, MergePolicy::Immutable),
    (DocumentField::Dimensions, MergePolicy::Immutable),
    (DocumentField::FileName, MergePolicy::Immutable),
    (DocumentField::Thumbnails, MergePolicy::FillIfEmpty),
    (DocumentField::Audio, MergePolicy::Immutable),
    (DocumentField::Sticker, MergePolicy::Immutable),
    (DocumentField::Animated, MergePolicy::Immutable),
    (DocumentField::SupportsStreaming, MergePolicy::Immutable),
];

/// Merge policy of a single field.
pub fn merge_policy(field: DocumentField) -> MergePolicy {
    MERGE_POLICIES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, policy)| *policy)
        .unwrap_or(MergePolicy::Immutable)
}

/// Apply a re-submission to a stored document. Returns the fields that changed.
fn merge_into(stored: &mut Document, incoming: &RawDocument) -> Vec<DocumentField> {
    let mut changed = Vec::new();

    for (field, policy) in MERGE_POLICIES {
        let applied = match (policy, field) {
            (MergePolicy::Immutable, _) => false,

            (MergePolicy::Overwrite, DocumentField::FileReference) => {
                stored.file_reference = incoming.file_reference.clone();
                true
            }

            (MergePolicy::FillIfEmpty, DocumentField::Thumbnails) => match &incoming.thumbs {
                Some(thumbs) if stored.thumbnails.is_empty() && !thumbs.is_empty() => {
                    stored.thumbnails = thumbs.clone();
                    true
                }
                _ => false,
            },

            (policy, field) => {
                debug!("No {:?} merge defined for {:?}, keeping stored value", policy, field);
                false
            }
        };

        if applied {
            changed.push(*field);
        }
    }

    changed
}

/// Build a document from a raw record and optional caller overrides.
fn create_document(
    raw: RawDocument,
    context: Option<DocumentContext>,
    text: &dyn RichTextProcessor,
) -> Document {
    let context = context.unwrap_or_default();

    let mime_type = context.mime_type.or(raw.mime_type);
    let route_id = context.route_id.unwrap_or(raw.dc_id);
    let thumbnails = context.thumbnails.or(raw.thumbs).unwrap_or_default();

    let classification = classify(
        &ClassificationInput {
            attributes: &raw.attributes,
            mime_type: mime_type.as_deref(),
            size: raw.size,
            variant: raw.variant,
            initial_kind: context.kind_hint.unwrap_or_default(),
            initial_file_name: context.file_name.as_deref(),
        },
        text,
    );

    let mut doc = Document {
        id: raw.id,
        variant: raw.variant,
        access_hash: raw.access_hash,
        file_reference: raw.file_reference,
        route_id,
        date: raw.date,
        mime_type: classification.mime_type,
        kind: classification.kind,
        size: classification.size,
        duration: classification.duration,
        width: classification.width,
        height: classification.height,
        file_name: classification.file_name,
        thumbnails,
        audio: classification.audio,
        sticker: classification.sticker,
        animated: classification.animated,
        supports_streaming: classification.supports_streaming,
        downloaded: false,
        access_url: String::new(),
    };
    doc.access_url = file_url(&doc, false, None);
    doc
}

/// Registry of canonical documents, keyed by id.
pub struct DocumentRegistry {
    docs: RwLock<HashMap<String, DocumentRef>>,
    text_processor: Arc<dyn RichTextProcessor>,
}

impl DocumentRegistry {
    pub fn new(text_processor: Arc<dyn RichTextProcessor>) -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            text_processor,
        }
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Store a raw document, or merge it into the stored one with the same id.
    ///
    /// Always returns the stored entity. `context` is only honored when the id
    /// is new.
    pub fn upsert(&self, raw: RawDocument, context: Option<DocumentContext>) -> DocumentRef {
        let mut docs = self.docs.write().unwrap();

        if let Some(existing) = docs.get(&raw.id) {
            let mut stored = existing.write().unwrap();
            let network_url = file_url(&stored, false, None);
            let changed = merge_into(&mut stored, &raw);

            // The network URL embeds the file reference, so refresh it while
            // it is still the one in use. Streamed documents keep it even
            // after downloading.
            if changed.contains(&DocumentField::FileReference)
                && stored.access_url == network_url
            {
                stored.access_url = file_url(&stored, false, None);
            }

            debug!("Merged document {} ({:?})", stored.id, changed);
            metrics::record_document_merge();
            return existing.clone();
        }

        let doc = create_document(raw, context, self.text_processor.as_ref());
        info!(
            "Registered document {} as {} ({}, {:#})",
            doc.id,
            doc.kind.as_str(),
            doc.mime_type,
            byte_unit::Byte::from(doc.size)
        );
        metrics::record_document_ingested(doc.kind.as_str());

        let id = doc.id.clone();
        let doc_ref = Arc::new(RwLock::new(doc));
        docs.insert(id, doc_ref.clone());
        metrics::set_documents_registered(docs.len());

        doc_ref
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolve an id to the stored document. An entity is returned unchanged.
    pub fn get(&self, key: impl Into<DocumentKey>) -> Option<DocumentRef> {
        match key.into() {
            DocumentKey::Id(id) => self.docs.read().unwrap().get(&id).cloned(),
            DocumentKey::Entity(doc) => Some(doc),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.docs.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of stored documents per kind.
    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let docs = self.docs.read().unwrap();
        let mut counts = BTreeMap::new();
        for doc in docs.values() {
            *counts.entry(doc.read().unwrap().kind.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::models::{
        AudioFlags, DocumentKind, RawAttribute, Thumbnail, VideoFlags,
    };
    use crate::media::HtmlTextProcessor;

    fn make_registry() -> DocumentRegistry {
        DocumentRegistry::new(Arc::new(HtmlTextProcessor))
    }

    fn voice_raw(id: &str, file_reference: Vec<u8>) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            access_hash: "42".to_string(),
            file_reference,
            mime_type: Some("audio/ogg".to_string()),
            size: 3000,
            dc_id: 4,
            attributes: vec![RawAttribute::Audio {
                duration: 3,
                title: None,
                performer: None,
                flags: AudioFlags { voice: true },
            }],
            ..Default::default()
        }
    }

    fn thumb(size_type: &str) -> Thumbnail {
        Thumbnail {
            size_type: size_type.to_string(),
            size: Some(100),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_creates_classified_document() {
        let registry = make_registry();
        let doc = registry.upsert(voice_raw("1", vec![1]), None);
        let doc = doc.read().unwrap();

        assert_eq!(doc.kind, DocumentKind::Voice);
        assert_eq!(doc.mime_type, "audio/ogg");
        assert_eq!(doc.route_id, 4);
        assert_eq!(doc.duration, Some(3));
        assert!(!doc.downloaded);
        assert!(doc.access_url.starts_with("document/"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_kind_is_stable_across_resubmissions() {
        let registry = make_registry();
        registry.upsert(voice_raw("1", vec![1]), None);

        let mut video = voice_raw("1", vec![2]);
        video.mime_type = Some("video/mp4".to_string());
        video.size = 999;
        video.attributes = vec![RawAttribute::Video {
            duration: 10,
            w: 640,
            h: 480,
            flags: VideoFlags::default(),
        }];
        let doc = registry.upsert(video, None);
        let doc = doc.read().unwrap();

        assert_eq!(doc.kind, DocumentKind::Voice);
        assert_eq!(doc.mime_type, "audio/ogg");
        assert_eq!(doc.size, 3000);
        assert_eq!(doc.width, None);
        assert_eq!(doc.file_reference, vec![2]);
    }

    #[test]
    fn test_file_reference_takes_latest_value() {
        let registry = make_registry();
        let first = registry.upsert(voice_raw("1", vec![1]), None);
        registry.upsert(voice_raw("1", vec![2]), None);
        let last = registry.upsert(voice_raw("1", vec![3]), None);

        assert!(Arc::ptr_eq(&first, &last));
        assert_eq!(first.read().unwrap().file_reference, vec![3]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_file_reference_refresh_updates_network_url() {
        let registry = make_registry();
        let doc = registry.upsert(voice_raw("1", vec![1]), None);
        let before = doc.read().unwrap().access_url.clone();

        registry.upsert(voice_raw("1", vec![9]), None);
        assert_ne!(doc.read().unwrap().access_url, before);
    }

    #[test]
    fn test_downloaded_document_keeps_local_url_on_merge() {
        let registry = make_registry();
        let doc = registry.upsert(voice_raw("1", vec![1]), None);
        {
            let mut stored = doc.write().unwrap();
            stored.downloaded = true;
            stored.access_url = "blob:local".to_string();
        }

        registry.upsert(voice_raw("1", vec![9]), None);
        assert_eq!(doc.read().unwrap().access_url, "blob:local");
    }

    #[test]
    fn test_downloaded_streaming_document_refreshes_network_url_on_merge() {
        let registry = make_registry();
        let doc = registry.upsert(voice_raw("1", vec![1]), None);
        let stale_url = {
            let mut stored = doc.write().unwrap();
            stored.downloaded = true;
            stored.supports_streaming = true;
            stored.access_url.clone()
        };

        registry.upsert(voice_raw("1", vec![99, 99]), None);
        let stored = doc.read().unwrap();
        assert_eq!(stored.file_reference, vec![99, 99]);
        assert_ne!(stored.access_url, stale_url);
        assert_eq!(stored.access_url, file_url(&stored, false, None));
    }

    #[test]
    fn test_thumbnails_fill_only_when_empty() {
        let registry = make_registry();
        let doc = registry.upsert(voice_raw("1", vec![1]), None);
        assert!(doc.read().unwrap().thumbnails.is_empty());

        let mut with_thumbs = voice_raw("1", vec![1]);
        with_thumbs.thumbs = Some(vec![thumb("m")]);
        registry.upsert(with_thumbs, None);
        assert_eq!(doc.read().unwrap().thumbnails, vec![thumb("m")]);

        let mut other_thumbs = voice_raw("1", vec![1]);
        other_thumbs.thumbs = Some(vec![thumb("x"), thumb("y")]);
        registry.upsert(other_thumbs, None);
        assert_eq!(doc.read().unwrap().thumbnails, vec![thumb("m")]);
    }

    #[test]
    fn test_context_overrides_apply_on_creation_only() {
        let registry = make_registry();
        let raw = RawDocument {
            id: "7".to_string(),
            dc_id: 1,
            ..Default::default()
        };
        let context = DocumentContext {
            mime_type: Some("image/jpeg".to_string()),
            file_name: Some("photo.jpg".to_string()),
            route_id: Some(5),
            thumbnails: Some(vec![thumb("s")]),
            kind_hint: Some(DocumentKind::PhotoSizeDoc),
        };
        let doc = registry.upsert(raw.clone(), Some(context));
        {
            let doc = doc.read().unwrap();
            assert_eq!(doc.kind, DocumentKind::PhotoSizeDoc);
            assert_eq!(doc.mime_type, "image/jpeg");
            assert_eq!(doc.file_name, "photo.jpg");
            assert_eq!(doc.route_id, 5);
            assert_eq!(doc.thumbnails.len(), 1);
        }

        let ignored = DocumentContext {
            route_id: Some(9),
            ..Default::default()
        };
        let doc = registry.upsert(raw, Some(ignored));
        assert_eq!(doc.read().unwrap().route_id, 5);
    }

    #[test]
    fn test_get_by_id_and_entity() {
        let registry = make_registry();
        let doc = registry.upsert(voice_raw("1", vec![1]), None);

        let by_id = registry.get("1").unwrap();
        assert!(Arc::ptr_eq(&doc, &by_id));
        assert!(registry.get("missing").is_none());

        let detached: DocumentRef = Arc::new(RwLock::new(doc.read().unwrap().clone()));
        let by_entity = registry.get(&detached).unwrap();
        assert!(Arc::ptr_eq(&detached, &by_entity));
    }

    #[test]
    fn test_empty_sentinel_is_stored_with_zero_size() {
        let registry = make_registry();
        let mut raw = RawDocument::empty("3");
        raw.size = 500;
        let doc = registry.upsert(raw, None);
        let doc = doc.read().unwrap();
        assert!(doc.is_empty_document());
        assert_eq!(doc.size, 0);
    }

    #[test]
    fn test_introspection() {
        let registry = make_registry();
        assert!(registry.is_empty());

        registry.upsert(voice_raw("2", vec![1]), None);
        registry.upsert(voice_raw("1", vec![1]), None);
        registry.upsert(RawDocument::empty("3"), None);

        assert_eq!(registry.ids(), vec!["1", "2", "3"]);
        let counts = registry.kind_counts();
        assert_eq!(counts.get("voice"), Some(&2));
        assert_eq!(counts.get("generic"), Some(&1));
    }

    #[test]
    fn test_merge_policy_table() {
        assert_eq!(merge_policy(DocumentField::FileReference), MergePolicy::Overwrite);
        assert_eq!(merge_policy(DocumentField::Thumbnails), MergePolicy::FillIfEmpty);
        assert_eq!(merge_policy(DocumentField::Kind), MergePolicy::Immutable);
        assert_eq!(merge_policy(DocumentField::MimeType), MergePolicy::Immutable);
    }
}
