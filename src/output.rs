//! Result types returned by an evaluation.

use crate::error::ExtractionError;
use crate::score::{Score, ScoreBand};
use serde::{Deserialize, Serialize};

/// A graded report together with the score pulled out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutput {
    /// Markdown report exactly as the grading service returned it.
    pub report: String,
    /// First `obtained/total` found in the report, if any.
    pub score: Option<Score>,
    /// Banner band for `score`; None without a score or with a zero total.
    pub band: Option<ScoreBand>,
    /// Why the question paper contributed no text, when it didn't.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<ExtractionError>,
    pub stats: EvaluationStats,
}

impl EvaluationOutput {
    /// Parse the score from `report` and assemble the output.
    pub fn from_report(report: String, stats: EvaluationStats) -> Self {
        let score = crate::score::parse_score(&report);
        let band = score.and_then(|s| s.band());
        Self {
            report,
            score,
            band,
            extraction_error: None,
            stats,
        }
    }
}

/// Counters for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub answer_sheets: usize,
    /// Length of the question text that went into the instruction.
    pub question_chars: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}
