//! Grading call: send the instruction and answer sheets, get a markdown report.
//!
//! [`GradingService`] is the seam between the session and the outside world.
//! [`LlmGradingService`] implements it over any `edgequake-llm` vision
//! provider; tests substitute their own implementation.
//!
//! There is exactly one attempt per submission. A failure is returned to the
//! caller, who can let the user submit again.

use crate::config::EvaluationConfig;
use crate::error::GradeError;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// What the grading service sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingReply {
    /// Markdown report.
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Something that can grade answer-sheet images against an instruction.
pub trait GradingService: Send + Sync {
    fn grade(
        &self,
        instruction: &str,
        images: Vec<ImageData>,
    ) -> impl Future<Output = Result<GradingReply, GradeError>> + Send;
}

/// [`GradingService`] backed by an `edgequake-llm` provider.
pub struct LlmGradingService {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmGradingService {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &EvaluationConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl GradingService for LlmGradingService {
    /// ## Message Layout
    ///
    /// A single user message carrying the instruction text followed by every
    /// answer sheet as an image attachment, in selection order.
    async fn grade(&self, instruction: &str, images: Vec<ImageData>) -> Result<GradingReply, GradeError> {
        let start = Instant::now();
        let image_count = images.len();
        let messages = vec![ChatMessage::user_with_images(instruction, images)];
        let options = self.options();

        match self.provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "Graded {} sheets: {} input tokens, {} output tokens, {:?}",
                    image_count,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(GradingReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                })
            }
            Err(e) => {
                warn!("Grading request failed after {:?}: {}", start.elapsed(), e);
                Err(GradeError::GradingFailed {
                    message: format!("{}", e),
                })
            }
        }
    }
}
