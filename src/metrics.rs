use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all docs-manager metrics
const PREFIX: &str = "docs_manager";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Registry Metrics
    pub static ref DOCUMENTS_INGESTED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_documents_ingested_total"),
            "Documents created in the registry"
        ),
        &["kind"]
    ).expect("Failed to create documents_ingested_total metric");

    pub static ref DOCUMENT_MERGES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_document_merges_total"),
        "Re-submissions merged into an existing document"
    ).expect("Failed to create document_merges_total metric");

    pub static ref DOCUMENTS_REGISTERED: Gauge = Gauge::new(
        format!("{PREFIX}_documents_registered"),
        "Number of documents held by the registry"
    ).expect("Failed to create documents_registered metric");

    // Download Metrics
    pub static ref DOWNLOADS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_downloads_total"), "Download requests by outcome"),
        &["outcome"]
    ).expect("Failed to create downloads_total metric");

    pub static ref DOWNLOAD_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_download_duration_seconds"),
            "Time from download start to completion"
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"]
    ).expect("Failed to create download_duration_seconds metric");

    pub static ref BYTES_FETCHED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_bytes_fetched_total"),
        "Total bytes received from the transport"
    ).expect("Failed to create bytes_fetched_total metric");

    // Transcode Metrics
    pub static ref TRANSCODES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_transcodes_total"), "Audio transcodes by outcome"),
        &["outcome"]
    ).expect("Failed to create transcodes_total metric");
}

/// Initialize all metrics
pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(DOCUMENTS_INGESTED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DOCUMENT_MERGES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DOCUMENTS_REGISTERED.clone()));
    let _ = REGISTRY.register(Box::new(DOWNLOADS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DOWNLOAD_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(BYTES_FETCHED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TRANSCODES_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record a newly created document
pub fn record_document_ingested(kind: &str) {
    DOCUMENTS_INGESTED_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a merge into an existing document
pub fn record_document_merge() {
    DOCUMENT_MERGES_TOTAL.inc();
}

pub fn set_documents_registered(count: usize) {
    DOCUMENTS_REGISTERED.set(count as f64);
}

/// Record a download state transition ("started", "deduplicated", "completed", "failed")
pub fn record_download(outcome: &str) {
    DOWNLOADS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record how long a finished download took
pub fn record_download_duration(outcome: &str, duration: Duration) {
    DOWNLOAD_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

pub fn record_bytes_fetched(bytes: usize) {
    BYTES_FETCHED_TOTAL.inc_by(bytes as f64);
}

/// Record a transcode attempt ("success" or "failure")
pub fn record_transcode(outcome: &str) {
    TRANSCODES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_text() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
