//! Error types for the answer-grader library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`GradeError`] is **fatal for one action**. The requested step cannot
//!   proceed (missing answer sheet, unreadable file, provider not configured,
//!   grading call failed). Returned as `Err(GradeError)`.
//!
//! * [`ExtractionError`] is **non-fatal**. The question paper's text layer
//!   could not be read. The session records it and carries on with empty
//!   question text, so the evaluation is sent with less context instead of
//!   being abandoned.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by loading, submission and grading operations.
///
/// Question-paper text extraction failures use [`ExtractionError`] and are
/// degraded by [`crate::session::EvaluationSession`] rather than propagated.
#[derive(Debug, Error)]
pub enum GradeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The answer sheet is not a PNG or JPEG image.
    #[error("Unsupported answer sheet '{path}': {reason}\nAccepted formats: .png, .jpg, .jpeg")]
    UnsupportedImage { path: PathBuf, reason: String },

    /// Text extraction was requested on its own and failed.
    #[error("Could not extract question text: {0}")]
    Extraction(#[from] ExtractionError),

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Submission errors ─────────────────────────────────────────────────
    /// Submit was requested without any answer sheet selected.
    #[error("No answer sheets selected.\nProvide at least one image with --answers.")]
    NoAnswerSheets,

    /// Submit was requested without a question paper or question text.
    #[error("No question content: select a question paper PDF or enter the question text.")]
    NoQuestionContent,

    /// A grading request is already outstanding for this session.
    #[error("An evaluation is already in progress; wait for it to finish.")]
    SubmissionInFlight,

    /// `complete_submission` was called without a matching `begin_submission`.
    #[error("No evaluation is in progress.")]
    NoSubmissionInFlight,

    // ── Grading errors ────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The grading service returned an error. There is no retry.
    #[error("Grading service error: {message}")]
    GradingFailed { message: String },

    /// The grading service answered with an empty report.
    #[error("Grading service returned an empty report")]
    EmptyReport,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output report file.
    #[error("Failed to write report file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure to read a question paper's text layer.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// No `%PDF` header within the first 1024 bytes of the payload.
    #[error("payload is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium could not parse the document structure.
    #[error("PDF could not be parsed: {detail}")]
    Unreadable { detail: String },

    /// The document is encrypted and no password is available.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// The text layer of one page could not be read.
    #[error("page {page}: text layer could not be read: {detail}")]
    PageText { page: usize, detail: String },

    /// No pdfium library could be bound.
    #[error(
        "PDF engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium or install libpdfium system-wide."
    )]
    EngineUnavailable(String),

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Internal(String),
}
