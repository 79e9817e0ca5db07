//! Pipeline stages for grading one submission.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (instruction)
//!   │                          │
//!   └────▶ encode ─────────────┴──▶ llm
//! (paths)  (base64)                 (VLM)
//! ```
//!
//! 1. [`input`]: load answer-sheet images and the question paper (path or URL)
//! 2. [`extract`]: read the question paper's text layer; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: base64-wrap each answer sheet for the multimodal request
//! 4. [`llm`]: the grading call; the only stage talking to the model

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
