mod file_config;

pub use file_config::{AudioConfig, DownloadManagerConfig, FileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::download_manager::DownloadSettings;

pub const DEFAULT_DOWNLOADER_TIMEOUT_SEC: u64 = 300;
pub const DEFAULT_MEDIA_PATH: &str = "./media";
pub const DEFAULT_DOWNLOADS_DIR: &str = "./downloads";
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub downloader_url: Option<String>,
    pub downloader_timeout_sec: u64,
    pub media_path: Option<PathBuf>,
    pub downloads_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            downloader_url: None,
            downloader_timeout_sec: DEFAULT_DOWNLOADER_TIMEOUT_SEC,
            media_path: None,
            downloads_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub downloader_url: Option<String>,
    pub downloader_timeout_sec: u64,
    pub media_path: PathBuf,
    pub downloads_dir: PathBuf,

    // Feature configs (with defaults)
    pub download_manager: DownloadManagerSettings,
    pub audio: AudioSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let downloader_url = file
            .downloader_url
            .or_else(|| cli.downloader_url.clone())
            .filter(|url| !url.trim().is_empty());

        if let Some(url) = &downloader_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("downloader_url must be an http(s) URL, got {:?}", url);
            }
        }

        let downloader_timeout_sec = file
            .downloader_timeout_sec
            .unwrap_or(cli.downloader_timeout_sec);
        if downloader_timeout_sec == 0 {
            bail!("downloader_timeout_sec must be greater than 0");
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_PATH));

        let downloads_dir = file
            .downloads_dir
            .map(PathBuf::from)
            .or_else(|| cli.downloads_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADS_DIR));

        if media_path.is_file() {
            bail!("media_path is not a directory: {:?}", media_path);
        }
        if downloads_dir.is_file() {
            bail!("downloads_dir is not a directory: {:?}", downloads_dir);
        }

        // Download manager settings - merge file config with defaults
        let dm_file = file.download_manager.unwrap_or_default();
        let dm_defaults = DownloadManagerSettings::default();
        let download_manager = DownloadManagerSettings {
            enabled: downloader_url.is_some(),
            retry_failed: dm_file.retry_failed.unwrap_or(dm_defaults.retry_failed),
            in_memory_blobs: dm_file.in_memory_blobs.unwrap_or(dm_defaults.in_memory_blobs),
        };

        let audio_file = file.audio.unwrap_or_default();
        let audio = AudioSettings {
            native_opus_playback: audio_file.native_opus_playback.unwrap_or(false),
            ffmpeg_path: audio_file
                .ffmpeg_path
                .unwrap_or_else(|| DEFAULT_FFMPEG_PATH.to_string()),
        };

        Ok(Self {
            downloader_url,
            downloader_timeout_sec,
            media_path,
            downloads_dir,
            download_manager,
            audio,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DownloadManagerSettings {
    pub enabled: bool, // true if downloader_url is set
    pub retry_failed: bool,
    pub in_memory_blobs: bool,
}

impl Default for DownloadManagerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            retry_failed: true,
            in_memory_blobs: false,
        }
    }
}

impl DownloadManagerSettings {
    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            retry_failed: self.retry_failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioSettings {
    pub native_opus_playback: bool,
    pub ffmpeg_path: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            native_opus_playback: false,
            ffmpeg_path: DEFAULT_FFMPEG_PATH.to_string(),
        }
    }
}
