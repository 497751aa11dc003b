//! Progress-callback trait for per-page and per-stage run events.
//!
//! Inject an [`Arc<dyn CorrectionProgressCallback>`] via
//! [`crate::config::CorrectionConfigBuilder::progress_callback`] to receive
//! events as the pipeline checks each page.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfcorrect::{CorrectionConfig, CorrectionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     issues: Arc<AtomicUsize>,
//! }
//!
//! impl CorrectionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, issue_count: usize) {
//!         self.issues.fetch_add(issue_count, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} issues", page_num, total_pages, issue_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     issues: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = CorrectionConfig::builder()
//!     .progress_callback(counter as Arc<dyn CorrectionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::correct::RunState;
use crate::output::CorrectionStats;
use std::sync::Arc;

/// Called by the pipeline as it moves through a run.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the page
/// events arrive from concurrently running futures. All methods default to
/// no-ops.
pub trait CorrectionProgressCallback: Send + Sync {
    /// Called once the document is loaded.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called on every state-machine transition.
    fn on_state_change(&self, state: &RunState) {
        let _ = state;
    }

    /// Called before the page detectors run on a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when every page detector finished on a page.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, issue_count: usize) {
        let _ = (page_num, total_pages, issue_count);
    }

    /// Called for each detector that failed on a page.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once when the run reaches `Done` or `Aborted`, or fails to
    /// write the artifact.
    fn on_run_complete(&self, stats: &CorrectionStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CorrectionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CorrectionConfig`].
pub type ProgressCallback = Arc<dyn CorrectionProgressCallback>;
