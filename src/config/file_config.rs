use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub downloader_url: Option<String>,
    pub downloader_timeout_sec: Option<u64>,
    pub media_path: Option<String>,
    pub downloads_dir: Option<String>,

    // Feature configs
    pub download_manager: Option<DownloadManagerConfig>,
    pub audio: Option<AudioConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DownloadManagerConfig {
    pub retry_failed: Option<bool>,
    pub in_memory_blobs: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AudioConfig {
    /// Whether the playback runtime decodes Ogg/Opus by itself
    pub native_opus_playback: Option<bool>,
    pub ffmpeg_path: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
