//! Progress-callback trait for extraction and grading events.
//!
//! Inject an [`Arc<dyn EvaluationProgressCallback>`] via
//! [`crate::config::EvaluationConfigBuilder::progress_callback`] to be told
//! when the question paper is being read and when the grading request is out.
//!
//! # Example
//!
//! ```rust
//! use answer_grader::{EvaluationConfig, EvaluationProgressCallback};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl EvaluationProgressCallback for Log {
//!     fn on_grading_complete(&self, report_len: usize) {
//!         eprintln!("report ready ({report_len} bytes)");
//!     }
//! }
//!
//! let config = EvaluationConfig::builder()
//!     .progress_callback(Arc::new(Log) as Arc<dyn EvaluationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the session as it extracts and grades.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: submissions
/// may be driven from a spawned task.
pub trait EvaluationProgressCallback: Send + Sync {
    /// Called before the question paper's text is extracted.
    fn on_extraction_start(&self, paper_name: &str) {
        let _ = paper_name;
    }

    /// Called when extraction finished.
    ///
    /// # Arguments
    /// * `pages`: pages read
    /// * `chars`: length of the concatenated text
    fn on_extraction_complete(&self, pages: usize, chars: usize) {
        let _ = (pages, chars);
    }

    /// Called when extraction failed and the session fell back to empty text.
    fn on_extraction_failed(&self, error: &str) {
        let _ = error;
    }

    /// Called just before the grading request is sent.
    fn on_grading_start(&self, answer_sheets: usize) {
        let _ = answer_sheets;
    }

    /// Called when the report arrived.
    fn on_grading_complete(&self, report_len: usize) {
        let _ = report_len;
    }

    /// Called when the grading request failed.
    fn on_grading_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EvaluationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EvaluationConfig`].
pub type ProgressCallback = Arc<dyn EvaluationProgressCallback>;
