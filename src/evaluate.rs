//! One-shot evaluation entry points.
//!
//! [`evaluate`] drives an [`EvaluationSession`] from file paths: load the
//! answer sheets, read the question paper, grade, and return the output.
//! Use the session directly when inputs arrive piecemeal (a form, a bot).

use crate::config::{EvaluationConfig, DEFAULT_MODEL};
use crate::error::GradeError;
use crate::output::{EvaluationOutput, EvaluationStats};
use crate::pipeline::extract::{extract_text, ExtractedText};
use crate::pipeline::input::{load_answer_sheets, load_question_paper};
use crate::pipeline::llm::{GradingService, LlmGradingService};
use crate::session::{EvaluationSession, GradingRequest};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// What to grade.
#[derive(Debug, Clone, Default)]
pub struct EvaluationInput {
    /// Answer-sheet images, in page order.
    pub answer_sheets: Vec<PathBuf>,
    /// Question paper PDF: local path or HTTP/HTTPS URL.
    pub question_paper: Option<String>,
    /// Question text. Replaces whatever was extracted from the paper.
    pub question_text: Option<String>,
}

/// Grade the answer sheets in `input`.
///
/// # Errors
/// Fails when an answer sheet cannot be loaded, no question content is
/// available, no provider can be resolved, or the grading call fails. An
/// unreadable question paper is not an error: grading continues without
/// its text.
pub async fn evaluate(
    input: &EvaluationInput,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, GradeError> {
    let provider = resolve_provider(config)?;
    let service = LlmGradingService::new(provider, config);
    evaluate_input_with(&service, input, config).await
}

/// [`evaluate`] with a caller-supplied grading service.
pub async fn evaluate_input_with<S: GradingService>(
    service: &S,
    input: &EvaluationInput,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, GradeError> {
    let mut session = EvaluationSession::new(config.clone());

    let sheets = load_answer_sheets(&input.answer_sheets).await?;
    session.select_answer_sheets(sheets);

    if let Some(ref source) = input.question_paper {
        let paper = load_question_paper(source, config.download_timeout_secs).await?;
        session.select_question_paper(paper).await;
    }
    if let Some(ref text) = input.question_text {
        session.set_question_text(text.clone());
    }

    session.submit(service).await.cloned()
}

/// Synchronous wrapper around [`evaluate`].
///
/// Creates a temporary tokio runtime internally.
pub fn evaluate_sync(
    input: &EvaluationInput,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, GradeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GradeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(evaluate(input, config))
}

/// Send one request to `service` and turn the reply into an output.
///
/// A reply that is empty or whitespace fails with [`GradeError::EmptyReport`].
pub async fn evaluate_with<S: GradingService>(
    service: &S,
    request: GradingRequest,
) -> Result<EvaluationOutput, GradeError> {
    let answer_sheets = request.images.len();
    let reply = service.grade(&request.instruction, request.images).await?;

    if reply.content.trim().is_empty() {
        return Err(GradeError::EmptyReport);
    }

    let stats = EvaluationStats {
        answer_sheets,
        question_chars: request.question_chars,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        duration_ms: request.started.elapsed().as_millis() as u64,
    };
    debug!("Report: {} chars", reply.content.len());
    Ok(EvaluationOutput::from_report(reply.content, stats))
}

/// Read a question paper's text without grading anything.
///
/// Does not require an LLM provider or API key. Unlike the session, an
/// extraction failure here is returned as [`GradeError::Extraction`].
pub async fn extract_question_text(
    source: &str,
    config: &EvaluationConfig,
) -> Result<ExtractedText, GradeError> {
    let paper = load_question_paper(source, config.download_timeout_secs).await?;
    let text = extract_text(paper.bytes, config.pdfium_library_path.clone()).await?;
    info!("Extracted {} pages from {}", text.page_count(), paper.name);
    Ok(text)
}

/// Write a report to `path`, creating parent directories.
///
/// Uses atomic write (temp file + rename) so a failed write never leaves a
/// truncated report behind.
pub async fn write_report(path: impl AsRef<Path>, report: &str) -> Result<(), GradeError> {
    let path = path.as_ref();
    let write_err = |e| GradeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, report).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, GradeError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        GradeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the grading provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`, or
///    [`DEFAULT_MODEL`].
/// 3. **Environment pair**: `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`,
///    when both are set and non-empty.
/// 4. **Gemini** when `GEMINI_API_KEY` is set.
/// 5. **Full auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &EvaluationConfig) -> Result<Arc<dyn LLMProvider>, GradeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| GradeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::GradingReply;
    use edgequake_llm::ImageData;
    use std::time::Instant;

    struct Fixed(&'static str);

    impl GradingService for Fixed {
        async fn grade(&self, _instruction: &str, _images: Vec<ImageData>) -> Result<GradingReply, GradeError> {
            Ok(GradingReply {
                content: self.0.to_string(),
                input_tokens: 1200,
                output_tokens: 640,
            })
        }
    }

    fn request(images: usize) -> GradingRequest {
        GradingRequest {
            instruction: "grade it".into(),
            images: (0..images).map(|_| ImageData::new("AAAA", "image/png")).collect(),
            question_chars: 8,
            started: Instant::now(),
        }
    }

    #[tokio::test]
    async fn stats_come_from_request_and_reply() {
        let out = evaluate_with(&Fixed("Total: 7/10"), request(3)).await.unwrap();
        assert_eq!(out.stats.answer_sheets, 3);
        assert_eq!(out.stats.question_chars, 8);
        assert_eq!(out.stats.input_tokens, 1200);
        assert_eq!(out.stats.output_tokens, 640);
        assert_eq!(out.score.map(|s| (s.obtained, s.total)), Some((7, 10)));
    }

    #[tokio::test]
    async fn blank_reply_is_empty_report() {
        let err = evaluate_with(&Fixed("\n\t "), request(1)).await.unwrap_err();
        assert!(matches!(err, GradeError::EmptyReport));
    }

    #[tokio::test]
    async fn evaluate_input_reports_missing_sheet() {
        let input = EvaluationInput {
            answer_sheets: vec![PathBuf::from("/nonexistent/sheet.png")],
            question_text: Some("Q1".into()),
            ..Default::default()
        };
        let err = evaluate_input_with(&Fixed("1/1"), &input, &EvaluationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::FileNotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn evaluate_input_needs_sheets() {
        let input = EvaluationInput {
            question_text: Some("Q1".into()),
            ..Default::default()
        };
        let err = evaluate_input_with(&Fixed("1/1"), &input, &EvaluationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::NoAnswerSheets));
    }

    #[tokio::test]
    async fn write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("alice.md");
        write_report(&path, "# 9/10\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# 9/10\n");
        assert!(!path.with_extension("md.tmp").exists());
    }

    #[tokio::test]
    async fn extract_question_text_rejects_missing_file() {
        let err = extract_question_text("/nonexistent/paper.pdf", &EvaluationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::FileNotFound { .. }));
    }
}
