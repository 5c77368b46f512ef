//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestBackend, TestEnv, PDF_ID};
//!
//! #[tokio::test]
//! async fn test_download_pdf() {
//!     let backend = TestBackend::spawn().await;
//!     let env = TestEnv::new(&backend, true, false);
//!
//!     let handle = env.manager.request_download(PDF_ID).unwrap();
//!     assert!(handle.wait().await.is_ok());
//! }
//! ```

mod backend;
mod constants;
mod env;
mod fixtures;
mod mocks;

// Public API - this is what tests import
pub use backend::TestBackend;
pub use constants::*;
pub use env::TestEnv;
#[allow(unused_imports)]
pub use fixtures::{raw_document, sample_documents, SAMPLE_DOCUMENTS_JSON};
#[allow(unused_imports)]
pub use mocks::{FakeAudioDecoder, DECODED_URL};
