//! Shared constants for end-to-end tests
//!
//! When the sample documents change, update only this file and the fixtures.

// ============================================================================
// Sample Document IDs
// ============================================================================

/// Plain PDF with a filename attribute and one remote thumbnail
pub const PDF_ID: &str = "1001";

/// Voice note (audio/ogg with the voice flag)
pub const VOICE_ID: &str = "1002";

/// 9 MB animated GIF, streamed
pub const BIG_GIF_ID: &str = "1003";

/// Vector animated sticker
pub const TGS_STICKER_ID: &str = "1004";

/// Raster sticker with an inline thumbnail
pub const WEBP_STICKER_ID: &str = "1005";

/// Round video message
pub const ROUND_ID: &str = "1006";

/// Empty-document sentinel
pub const EMPTY_ID: &str = "1007";

// ============================================================================
// Payloads
// ============================================================================

pub const PDF_BYTES: &[u8] = b"%PDF-1.4 test document";

pub const VOICE_BYTES: &[u8] = b"OggS voice payload";

pub const GIF_BYTES: &[u8] = b"GIF89a animation";
