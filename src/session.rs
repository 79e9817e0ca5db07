//! Evaluation session: the state behind one grading form.
//!
//! ```text
//!             begin_submission            complete_submission(Ok)
//!  Composing ─────────────────▶ Grading ─────────────────────────▶ Reviewed
//!      ▲                           │                                  │
//!      └── complete_submission(Err)┘            reset ────────────────┘
//! ```
//!
//! Inputs (answer sheets, question paper, question text, maximum marks) can
//! be changed in any phase. A [`GradingRequest`] is an owned snapshot, so a
//! change made while grading only affects the next submission. Only one
//! request may be outstanding: `begin_submission` refuses while grading.

use crate::config::EvaluationConfig;
use crate::error::{ExtractionError, GradeError};
use crate::evaluate::evaluate_with;
use crate::output::EvaluationOutput;
use crate::pipeline::encode::encode_sheets;
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::{AnswerSheet, QuestionPaper};
use crate::pipeline::llm::GradingService;
use crate::prompts::evaluation_instruction;
use crate::score::Score;
use edgequake_llm::ImageData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// Inputs are being gathered.
    Composing,
    /// A grading request is outstanding.
    Grading,
    /// The last grading request succeeded.
    Reviewed(EvaluationOutput),
}

/// Everything the grading service needs for one submission.
#[derive(Debug, Clone)]
pub struct GradingRequest {
    /// Rubric, maximum marks and question text.
    pub instruction: String,
    /// Answer sheets in selection order.
    pub images: Vec<ImageData>,
    /// Length of the question text embedded in `instruction`.
    pub question_chars: usize,
    pub started: Instant,
}

/// Form state for grading one set of answer sheets.
pub struct EvaluationSession {
    config: EvaluationConfig,
    answer_sheets: Vec<AnswerSheet>,
    question_paper: Option<QuestionPaper>,
    question_text: String,
    // True while `question_text` is exactly what the current paper yielded.
    text_from_paper: bool,
    extraction_error: Option<ExtractionError>,
    max_marks: u32,
    phase: SessionPhase,
}

impl EvaluationSession {
    pub fn new(config: EvaluationConfig) -> Self {
        let max_marks = config.max_marks.max(1);
        Self {
            config,
            answer_sheets: Vec::new(),
            question_paper: None,
            question_text: String::new(),
            text_from_paper: false,
            extraction_error: None,
            max_marks,
            phase: SessionPhase::Composing,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn answer_sheets(&self) -> &[AnswerSheet] {
        &self.answer_sheets
    }

    pub fn question_paper(&self) -> Option<&QuestionPaper> {
        self.question_paper.as_ref()
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn max_marks(&self) -> u32 {
        self.max_marks
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_grading(&self) -> bool {
        matches!(self.phase, SessionPhase::Grading)
    }

    /// Why the current question paper yielded no text, if it didn't.
    pub fn extraction_error(&self) -> Option<&ExtractionError> {
        self.extraction_error.as_ref()
    }

    /// The last successful evaluation.
    pub fn output(&self) -> Option<&EvaluationOutput> {
        match &self.phase {
            SessionPhase::Reviewed(output) => Some(output),
            _ => None,
        }
    }

    pub fn score(&self) -> Option<Score> {
        self.output().and_then(|o| o.score)
    }

    /// Replace the selected answer sheets.
    pub fn select_answer_sheets(&mut self, sheets: Vec<AnswerSheet>) {
        debug!("Selected {} answer sheets", sheets.len());
        self.answer_sheets = sheets;
    }

    /// Select a question paper and extract its text.
    ///
    /// On success the question text is replaced by the extracted text. On
    /// failure the error is logged and recorded, and the session continues
    /// without it: text typed by the user is kept, text extracted from a
    /// previous paper is dropped.
    pub async fn select_question_paper(&mut self, paper: QuestionPaper) {
        let cb = self.config.progress_callback.clone();
        if let Some(ref cb) = cb {
            cb.on_extraction_start(&paper.name);
        }

        let bytes = Arc::clone(&paper.bytes);
        let name = paper.name.clone();
        self.question_paper = Some(paper);

        match extract_text(bytes, self.config.pdfium_library_path.clone()).await {
            Ok(text) => {
                let pages = text.page_count();
                self.question_text = text.into_string();
                self.text_from_paper = true;
                self.extraction_error = None;
                info!(
                    "Extracted {} chars from {} ({} pages)",
                    self.question_text.len(),
                    name,
                    pages
                );
                if let Some(ref cb) = cb {
                    cb.on_extraction_complete(pages, self.question_text.len());
                }
            }
            Err(e) => {
                warn!("Error extracting text from '{}': {}", name, e);
                if self.text_from_paper {
                    self.question_text.clear();
                    self.text_from_paper = false;
                }
                if let Some(ref cb) = cb {
                    cb.on_extraction_failed(&e.to_string());
                }
                self.extraction_error = Some(e);
            }
        }
    }

    /// Set the question text by hand (overrides anything extracted).
    pub fn set_question_text(&mut self, text: impl Into<String>) {
        self.question_text = text.into();
        self.text_from_paper = false;
    }

    /// Set the maximum marks; values below 1 become 1.
    pub fn set_max_marks(&mut self, marks: u32) {
        self.max_marks = marks.max(1);
    }

    /// Whether [`Self::begin_submission`] would succeed.
    pub fn can_submit(&self) -> bool {
        !self.is_grading() && !self.answer_sheets.is_empty() && self.has_question_content()
    }

    fn has_question_content(&self) -> bool {
        self.question_paper.is_some() || !self.question_text.trim().is_empty()
    }

    /// Snapshot the inputs into a request and move to [`SessionPhase::Grading`].
    pub fn begin_submission(&mut self) -> Result<GradingRequest, GradeError> {
        if self.is_grading() {
            return Err(GradeError::SubmissionInFlight);
        }
        if self.answer_sheets.is_empty() {
            return Err(GradeError::NoAnswerSheets);
        }
        if !self.has_question_content() {
            return Err(GradeError::NoQuestionContent);
        }

        let instruction = evaluation_instruction(
            self.max_marks,
            &self.question_text,
            self.config.system_prompt.as_deref(),
        );
        let images = encode_sheets(&self.answer_sheets);

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_grading_start(images.len());
        }
        info!(
            "Submitting {} answer sheets (max marks {})",
            images.len(),
            self.max_marks
        );

        self.phase = SessionPhase::Grading;
        Ok(GradingRequest {
            instruction,
            images,
            question_chars: self.question_text.len(),
            started: Instant::now(),
        })
    }

    /// Record the outcome of the outstanding request.
    ///
    /// Success moves to [`SessionPhase::Reviewed`]; failure moves back to
    /// [`SessionPhase::Composing`] and hands the error back to the caller.
    pub fn complete_submission(
        &mut self,
        result: Result<EvaluationOutput, GradeError>,
    ) -> Result<&EvaluationOutput, GradeError> {
        if !self.is_grading() {
            return Err(GradeError::NoSubmissionInFlight);
        }

        match result {
            Ok(mut output) => {
                output.extraction_error = self.extraction_error.clone();
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_grading_complete(output.report.len());
                }
                match output.score {
                    Some(score) => info!("Evaluation complete: {}", score),
                    None => info!("Evaluation complete: no score found in report"),
                }
                self.phase = SessionPhase::Reviewed(output);
                self.output()
                    .ok_or_else(|| GradeError::Internal("reviewed phase without output".into()))
            }
            Err(e) => {
                warn!("Error processing evaluation: {}", e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_grading_error(&e.to_string());
                }
                self.phase = SessionPhase::Composing;
                Err(e)
            }
        }
    }

    /// Begin a submission, grade it with `service`, and record the outcome.
    pub async fn submit<S: GradingService>(
        &mut self,
        service: &S,
    ) -> Result<&EvaluationOutput, GradeError> {
        let request = self.begin_submission()?;
        let result = evaluate_with(service, request).await;
        self.complete_submission(result)
    }

    /// Discard every input and result; keeps the configuration.
    pub fn reset(&mut self) {
        debug!("Session reset");
        let config = self.config.clone();
        *self = Self::new(config);
    }
}
