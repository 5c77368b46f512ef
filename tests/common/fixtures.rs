//! Sample raw documents, in the remote protocol's JSON shape.

use docs_manager::RawDocument;

pub const SAMPLE_DOCUMENTS_JSON: &str = r#"[
    {
        "_": "document",
        "id": "1001",
        "access_hash": "5550001",
        "file_reference": [10, 20, 30],
        "date": 1700000000,
        "mime_type": "application/pdf",
        "size": 22,
        "dc_id": 2,
        "thumbs": [{"type": "m", "w": 90, "h": 90, "size": 512}],
        "attributes": [
            {"_": "documentAttributeFilename", "file_name": "Q3 report.pdf"}
        ]
    },
    {
        "_": "document",
        "id": "1002",
        "access_hash": "5550002",
        "file_reference": [1],
        "mime_type": "audio/ogg",
        "size": 18,
        "dc_id": 4,
        "attributes": [
            {"_": "documentAttributeAudio", "duration": 3, "pFlags": {"voice": true}}
        ]
    },
    {
        "_": "document",
        "id": "1003",
        "access_hash": "5550003",
        "file_reference": [2],
        "mime_type": "image/gif",
        "size": 9000000,
        "dc_id": 1,
        "attributes": [
            {"_": "documentAttributeImageSize", "w": 320, "h": 240},
            {"_": "documentAttributeAnimated"}
        ]
    },
    {
        "_": "document",
        "id": "1004",
        "access_hash": "5550004",
        "file_reference": [3],
        "mime_type": "application/x-tgsticker",
        "size": 4096,
        "dc_id": 1,
        "attributes": [
            {"_": "documentAttributeSticker"},
            {"_": "documentAttributeFilename", "file_name": "AnimatedSticker.tgs"}
        ]
    },
    {
        "_": "document",
        "id": "1005",
        "access_hash": "5550005",
        "file_reference": [4],
        "mime_type": "image/webp",
        "size": 2048,
        "dc_id": 1,
        "thumbs": [{"type": "i", "bytes": [1, 2, 3]}, {"type": "m", "size": 300}],
        "attributes": [
            {"_": "documentAttributeImageSize", "w": 512, "h": 512},
            {
                "_": "documentAttributeSticker",
                "alt": "<3",
                "stickerset": {"_": "inputStickerSetID", "id": "77", "access_hash": "88"}
            }
        ]
    },
    {
        "_": "document",
        "id": "1006",
        "access_hash": "5550006",
        "file_reference": [5],
        "size": 100000,
        "dc_id": 3,
        "attributes": [
            {"_": "documentAttributeVideo", "duration": 5, "w": 240, "h": 240, "pFlags": {"round_message": true}}
        ]
    },
    {"_": "documentEmpty", "id": "1007"}
]"#;

pub fn sample_documents() -> Vec<RawDocument> {
    serde_json::from_str(SAMPLE_DOCUMENTS_JSON).expect("sample documents must parse")
}

/// One sample document by id.
pub fn raw_document(id: &str) -> RawDocument {
    sample_documents()
        .into_iter()
        .find(|doc| doc.id == id)
        .unwrap_or_else(|| panic!("no sample document {}", id))
}
