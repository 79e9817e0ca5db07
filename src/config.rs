//! Configuration for an evaluation session.
//!
//! All behaviour is controlled through [`EvaluationConfig`], built via its
//! [`EvaluationConfigBuilder`]. Callers set only what they care about and
//! rely on the documented defaults for the rest.

use crate::error::GradeError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default maximum marks for a paper.
pub const DEFAULT_MAX_MARKS: u32 = 100;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for grading answer sheets.
///
/// # Example
/// ```rust
/// use answer_grader::EvaluationConfig;
///
/// let config = EvaluationConfig::builder()
///     .max_marks(50)
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_marks, 50);
/// ```
#[derive(Clone)]
pub struct EvaluationConfig {
    /// Marks the whole paper is graded out of. Minimum 1. Default: 100.
    pub max_marks: u32,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or the
    /// provider's default when auto-detected.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Grading should be repeatable; a low temperature keeps two runs over
    /// the same sheets close to each other.
    pub temperature: f32,

    /// Maximum tokens the report may use. Default: 4096.
    ///
    /// A per-question breakdown with feedback for a ten-question paper runs
    /// to roughly 1 500 tokens; too low a limit cuts the report off before
    /// the feedback sections.
    pub max_tokens: usize,

    /// Replacement rubric. If None, uses [`crate::prompts::DEFAULT_RUBRIC`].
    pub system_prompt: Option<String>,

    /// Download timeout for question papers given as URLs, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Directory (or file) holding libpdfium. If None, `PDFIUM_LIB_PATH`, the
    /// working directory and the system library path are tried.
    pub pdfium_library_path: Option<PathBuf>,

    /// Receives extraction and grading events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_marks: DEFAULT_MAX_MARKS,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            system_prompt: None,
            download_timeout_secs: 120,
            pdfium_library_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EvaluationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationConfig")
            .field("max_marks", &self.max_marks)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|s| s.len()))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl EvaluationConfig {
    /// Create a new builder for `EvaluationConfig`.
    pub fn builder() -> EvaluationConfigBuilder {
        EvaluationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EvaluationConfig`].
#[derive(Debug)]
pub struct EvaluationConfigBuilder {
    config: EvaluationConfig,
}

impl EvaluationConfigBuilder {
    pub fn max_marks(mut self, marks: u32) -> Self {
        self.config.max_marks = marks;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EvaluationConfig, GradeError> {
        let c = &self.config;
        if c.max_marks == 0 {
            return Err(GradeError::InvalidConfig(
                "Maximum marks must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(GradeError::InvalidConfig(
                "Max tokens must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(GradeError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
