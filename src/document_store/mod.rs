//! Document metadata: raw protocol records, classification and the registry.

mod classifier;
mod models;
mod registry;

pub use classifier::{
    classify, supports_streaming, Classification, ClassificationInput,
    GIF_STREAMING_THRESHOLD_BYTES, VECTOR_STICKER_FILE_NAME, VECTOR_STICKER_MIME,
};
pub use models::{
    AudioFlags, AudioMeta, Document, DocumentContext, DocumentKind, DocumentVariant,
    InputStickerSet, RawAttribute, RawDocument, StickerFormat, StickerInfo, Thumbnail, VideoFlags,
};
pub use registry::{
    merge_policy, DocumentField, DocumentKey, DocumentRef, DocumentRegistry, MergePolicy,
    MERGE_POLICIES,
};
