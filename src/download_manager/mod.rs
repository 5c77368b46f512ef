//! Download Manager module
//!
//! Deduplicated document downloads with local materialization and the voice
//! transcode fallback.

mod manager;
mod models;
mod transcode;

pub use manager::DownloadManager;
pub use models::*;
pub use transcode::TranscodeFallback;
