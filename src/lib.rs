//! docs-manager library
//!
//! Document metadata registry and deduplicated download orchestration.

pub mod config;
pub mod document_store;
pub mod download_manager;
pub mod location;
pub mod media;
pub mod metrics;
pub mod transport;

// Re-export commonly used types for convenience
pub use document_store::{Document, DocumentKind, DocumentRef, DocumentRegistry, RawDocument};
pub use download_manager::{DownloadError, DownloadHandle, DownloadManager};
pub use location::{AddressDescriptor, CacheKey};
pub use transport::{HttpTransport, Transport, TransportError};
