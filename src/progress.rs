//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline writes each page.
//!
//! # Example
//!
//! ```rust
//! use pdfshift::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} written ({} bytes)", page_num, total_pages, bytes);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::OutputBundle;
use crate::request::ConversionMode;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are reported strictly in document order.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after rasterisation, before any page is written.
    ///
    /// # Arguments
    /// * `mode`        — the conversion target
    /// * `total_pages` — number of pages that will be written
    fn on_conversion_start(&self, mode: ConversionMode, total_pages: usize) {
        let _ = (mode, total_pages);
    }

    /// Called before a page is encoded or placed.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages being written
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page has been handed to the writer or archive.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `bytes`       — encoded size of the page image
    fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
        let _ = (page_num, total_pages, bytes);
    }

    /// Called once the final artifact is in place.
    fn on_conversion_complete(&self, bundle: &OutputBundle) {
        let _ = bundle;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
