//! # answer-grader
//!
//! Grade scanned answer sheets against a question paper using Vision
//! Language Models (VLMs).
//!
//! The question paper's text is pulled from its PDF, the answer sheets are
//! sent as images, and the model returns a markdown report with per-question
//! marks and feedback. The first `obtained/total` in the report becomes the
//! headline [`Score`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! answer sheets (PNG/JPEG)      question paper (PDF, path or URL)
//!  │                             │
//!  │                             ├─ extract  text layer via pdfium (spawn_blocking)
//!  ├─ encode  base64 ImageData   │
//!  └──────────────┬──────────────┘
//!                 ├─ instruct  rubric + max marks + question text
//!                 ├─ grade     one VLM call (gemini / openai / anthropic / …)
//!                 └─ score     first "a/b" in the report → banner band
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use answer_grader::{evaluate, EvaluationConfig, EvaluationInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ...
//!     let config = EvaluationConfig::builder().max_marks(50).build()?;
//!     let input = EvaluationInput {
//!         answer_sheets: vec!["page1.jpg".into(), "page2.jpg".into()],
//!         question_paper: Some("questions.pdf".into()),
//!         question_text: None,
//!     };
//!     let output = evaluate(&input, &config).await?;
//!     println!("{}", output.report);
//!     if let Some(score) = output.score {
//!         eprintln!("score: {score}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `grade` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! answer-grader = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod evaluate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod score;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EvaluationConfig, EvaluationConfigBuilder};
pub use error::{ExtractionError, GradeError};
pub use evaluate::{
    evaluate, evaluate_input_with, evaluate_sync, evaluate_with, extract_question_text,
    resolve_provider, write_report, EvaluationInput,
};
pub use output::{EvaluationOutput, EvaluationStats};
pub use pipeline::extract::{extract_text, ExtractedText};
pub use pipeline::input::{AnswerSheet, QuestionPaper};
pub use pipeline::llm::{GradingReply, GradingService, LlmGradingService};
pub use progress::{EvaluationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use score::{parse_score, Score, ScoreBand};
pub use session::{EvaluationSession, GradingRequest, SessionPhase};
