use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docs_manager::config::{AppConfig, CliConfig, FileConfig, DEFAULT_DOWNLOADER_TIMEOUT_SEC};
use docs_manager::document_store::{DocumentRegistry, RawDocument};
use docs_manager::download_manager::DownloadManager;
use docs_manager::location::{choose_access_mode, resolve_thumbnail, ThumbnailPreview};
use docs_manager::media::{
    BlobStore, FfmpegAudioDecoder, FsBlobStore, HtmlTextProcessor, InlinePreviewDecoder,
    MemoryBlobStore,
};
use docs_manager::metrics;
use docs_manager::transport::{HttpTransport, Transport, UnconfiguredTransport};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[clap(version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")))]
struct CliArgs {
    /// Path to a JSON file holding an array of raw documents.
    #[clap(value_parser = parse_path)]
    pub documents: PathBuf,

    /// Path to a TOML config file. Its values override the CLI ones.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Base URL of the file backend used to download documents.
    #[clap(long)]
    pub downloader_url: Option<String>,

    /// Timeout in seconds for backend requests.
    #[clap(long, default_value_t = DEFAULT_DOWNLOADER_TIMEOUT_SEC)]
    pub downloader_timeout_sec: u64,

    /// Directory downloaded documents are materialized into.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// Directory saved documents are written to.
    #[clap(long, value_parser = parse_path)]
    pub downloads_dir: Option<PathBuf>,

    /// Id of a document to download. Can be repeated; downloads run concurrently.
    #[clap(long = "download", value_name = "ID")]
    pub download: Vec<String>,

    /// Id of a document to save to the downloads directory. Can be repeated.
    #[clap(long = "save", value_name = "ID")]
    pub save: Vec<String>,

    /// Print Prometheus metrics before exiting.
    #[clap(long)]
    pub print_metrics: bool,
}

fn load_documents(path: &Path) -> Result<Vec<RawDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read documents file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse documents file: {:?}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = CliConfig {
        downloader_url: cli_args.downloader_url.clone(),
        downloader_timeout_sec: cli_args.downloader_timeout_sec,
        media_path: cli_args.media_path.clone(),
        downloads_dir: cli_args.downloads_dir.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    // Registry
    let registry = Arc::new(DocumentRegistry::new(Arc::new(HtmlTextProcessor)));
    let raw_documents = load_documents(&cli_args.documents)?;
    info!(
        "Ingesting {} documents from {:?}",
        raw_documents.len(),
        cli_args.documents
    );
    for raw in raw_documents {
        let doc = registry.upsert(raw, None);
        let doc = doc.read().unwrap();
        let mode = choose_access_mode(&doc, false, None);
        let preview = match resolve_thumbnail(&doc, true, &InlinePreviewDecoder) {
            Some(ThumbnailPreview::Inline(_)) => "inline",
            Some(ThumbnailPreview::Remote(_)) => "remote",
            None => "none",
        };
        debug!(
            "Document {}: {} via {} (thumbnail: {})",
            doc.id,
            doc.kind.as_str(),
            mode.as_str(),
            preview
        );
    }
    for (kind, count) in registry.kind_counts() {
        info!("  {}: {}", kind, count);
    }
    info!("Registry holds {} documents", registry.len());

    if cli_args.download.is_empty() && cli_args.save.is_empty() {
        return print_metrics(cli_args.print_metrics);
    }

    // Collaborators
    let transport: Arc<dyn Transport> = match &config.downloader_url {
        Some(url) => {
            info!("Using file backend at {}", url);
            Arc::new(HttpTransport::new(
                url,
                config.downloader_timeout_sec,
                &config.downloads_dir,
            )?)
        }
        None => {
            warn!("No downloader URL configured, downloads will fail");
            Arc::new(UnconfiguredTransport)
        }
    };
    let blob_store: Arc<dyn BlobStore> = if config.download_manager.in_memory_blobs {
        Arc::new(MemoryBlobStore::new())
    } else {
        Arc::new(FsBlobStore::new(&config.media_path))
    };
    let audio_decoder = Arc::new(FfmpegAudioDecoder::new(
        config.audio.ffmpeg_path.clone(),
        config.audio.native_opus_playback,
        blob_store.clone(),
    ));
    let manager = DownloadManager::new(
        registry.clone(),
        transport,
        blob_store,
        audio_decoder,
        config.download_manager.download_settings(),
    );

    let mut failures = 0;

    // Downloads
    let mut handles = Vec::new();
    for id in &cli_args.download {
        match manager.request_download(id) {
            Ok(handle) => handles.push((id.clone(), handle)),
            Err(e) => {
                error!("Cannot download {}: {}", id, e);
                failures += 1;
            }
        }
    }
    let results = futures::future::join_all(handles.iter().map(|(_, h)| h.wait())).await;
    for ((id, _), result) in handles.iter().zip(results) {
        match result {
            Ok(blob) => info!("Downloaded {} -> {}", id, blob.url),
            Err(e) => {
                error!("Download of {} failed: {}", id, e);
                failures += 1;
            }
        }
    }

    // Saves
    for id in &cli_args.save {
        match manager.save_to_disk(id).await {
            Ok(path) => info!("Saved {} to {:?}", id, path),
            Err(e) => {
                error!("Save of {} failed: {}", id, e);
                failures += 1;
            }
        }
    }

    info!(
        "Download status: {}",
        serde_json::to_string(&manager.get_status())?
    );

    print_metrics(cli_args.print_metrics)?;

    let total = cli_args.download.len() + cli_args.save.len();
    if failures > 0 {
        bail!("{} of {} operations failed", failures, total);
    }
    Ok(())
}

fn print_metrics(enabled: bool) -> Result<()> {
    if enabled {
        print!("{}", metrics::gather_text()?);
    }
    Ok(())
}
