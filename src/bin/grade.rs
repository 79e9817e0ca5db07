//! CLI binary for answer-grader.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EvaluationConfig`/`EvaluationInput`, prints the score banner and writes
//! the report.

use anyhow::{Context, Result};
use answer_grader::{
    evaluate, extract_question_text, write_report, EvaluationConfig, EvaluationInput,
    EvaluationOutput, EvaluationProgressCallback, ProgressCallback, ScoreBand,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn blue(s: &str) -> String {
    format!("\x1b[34m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn band_colour(band: ScoreBand, s: &str) -> String {
    match band {
        ScoreBand::Excellent => green(s),
        ScoreBand::Good => blue(s),
        ScoreBand::KeepImproving => yellow(s),
        ScoreBand::NeedsPractice => red(s),
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the question paper is read and the sheets are graded.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading answer sheets…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Stop the spinner when evaluation ends before grading reports back.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl EvaluationProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, paper_name: &str) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(paper_name.to_string());
    }

    fn on_extraction_complete(&self, pages: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Question paper  {}",
            green("✓"),
            dim(&format!("{pages} pages, {chars} chars")),
        ));
    }

    fn on_extraction_failed(&self, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} Question paper text unavailable: {}",
            yellow("⚠"),
            dim(first_line),
        ));
    }

    fn on_grading_start(&self, answer_sheets: usize) {
        self.bar.set_prefix("Grading");
        self.bar.set_message(format!("{answer_sheets} answer sheets"));
    }

    fn on_grading_complete(&self, _report_len: usize) {
        self.bar.finish_and_clear();
    }

    fn on_grading_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Grade two answer-sheet scans against a question paper (report on stdout)
  grade --answers page1.jpg page2.jpg --question-paper questions.pdf

  # Paper marked out of 50, report saved to a file
  grade -a page1.png -p questions.pdf --max-marks 50 -o alice.md

  # No PDF: type the questions instead
  grade -a page1.jpg --question-text "Q1. Define osmosis. Q2. Explain diffusion."

  # Question paper from a URL, a different model
  grade -a page1.jpg -p https://example.com/paper.pdf --provider openai --model gpt-4.1

  # Check what text the question paper yields (no API key needed)
  grade --extract-only -p questions.pdf

  # JSON output (report, score, band, stats)
  grade --json -a page1.jpg -p questions.pdf > result.json
  grade --json -a page1.jpg -p questions.pdf -o result.json

SCORE BANNER:
  The first "obtained/total" in the report is the headline score.
  >= 80%  Excellent      >= 60%  Good Job
  >= 40%  Keep Improving  < 40%  Need More Practice

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium
"#;

/// Grade answer-sheet images against a question paper using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "grade",
    version,
    about = "Grade answer-sheet images against a question paper using Vision LLMs",
    long_about = "Extract the questions from a question-paper PDF, send them with scanned answer \
sheets to a Vision Language Model, and print the markdown evaluation report with an overall \
score. Supports Google Gemini, OpenAI, Anthropic and any provider edgequake-llm knows.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Answer-sheet images (.png, .jpg, .jpeg), in page order.
    #[arg(short, long, num_args = 1.., value_delimiter = ',', env = "GRADE_ANSWERS")]
    answers: Vec<PathBuf>,

    /// Question paper PDF: local file path or HTTP/HTTPS URL.
    #[arg(short = 'p', long, env = "GRADE_QUESTION_PAPER")]
    question_paper: Option<String>,

    /// Question text; replaces text extracted from the question paper.
    #[arg(long, env = "GRADE_QUESTION_TEXT", conflicts_with = "question_text_file")]
    question_text: Option<String>,

    /// Read the question text from this file.
    #[arg(long, env = "GRADE_QUESTION_TEXT_FILE")]
    question_text_file: Option<PathBuf>,

    /// Marks the whole paper is graded out of.
    #[arg(short, long, env = "GRADE_MAX_MARKS", default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_marks: u32,

    /// Write the report (or the JSON with --json) to this file instead of stdout.
    #[arg(short, long, env = "GRADE_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(
        long,
        env = "EDGEQUAKE_MODEL",
        long_help = "Vision LLM model to use. Default: gemini-2.0-flash.\n\
          The model must accept image input."
    )]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: gemini, openai, anthropic, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Path to a text file containing a replacement rubric.
    #[arg(long, env = "GRADE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens for the report.
    #[arg(long, env = "GRADE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "GRADE_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Directory (or file) holding libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// HTTP download timeout in seconds for question-paper URLs.
    #[arg(long, env = "GRADE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (EvaluationOutput) instead of Markdown.
    #[arg(long, env = "GRADE_JSON")]
    json: bool,

    /// Print the question paper's extracted text only, no grading.
    #[arg(long)]
    extract_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "GRADE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GRADE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the report.
    #[arg(short, long, env = "GRADE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level feedback; only errors get through.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let source = cli
            .question_paper
            .as_deref()
            .context("--extract-only needs --question-paper")?;
        let config = build_config(&cli, None).await?;
        let text = extract_question_text(source, &config)
            .await
            .context("Failed to extract question text")?;

        if cli.json {
            let json = serde_json::json!({ "pages": text.pages() });
            emit_json(&json, cli.output.as_deref()).await?;
        } else {
            print!("{text}");
        }
        return Ok(());
    }

    // ── Build config and input ───────────────────────────────────────────
    let input = build_input(&cli).await?;

    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn EvaluationProgressCallback>);

    // ── Run evaluation ───────────────────────────────────────────────────
    let result = async {
        let config = build_config(&cli, progress_cb).await?;
        evaluate(&input, &config).await.context("Evaluation failed")
    }
    .await;
    if let Some(ref spinner) = spinner {
        spinner.clear();
    }
    let output = result?;

    if cli.json {
        emit_json(&output, cli.output.as_deref()).await?;
        if let (Some(path), false) = (&cli.output, cli.quiet) {
            eprintln!("{}  json  →  {}", green("✔"), bold(&path.display().to_string()));
        }
        return Ok(());
    }

    if !cli.quiet {
        print_banner(&output);
    }

    if let Some(ref output_path) = cli.output {
        write_report(output_path, &output.report)
            .await
            .context("Failed to save report")?;
        if !cli.quiet {
            eprintln!("{}  report  →  {}", green("✔"), bold(&output_path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.report.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.report.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.duration_ms,
        );
    }

    Ok(())
}

/// Pretty JSON to `path` when given, otherwise to stdout.
async fn emit_json<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    match path {
        Some(path) => write_report(path, &format!("{json}\n"))
            .await
            .context("Failed to save JSON output"),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/// Score banner on stderr, coloured by band.
fn print_banner(output: &EvaluationOutput) {
    match (output.score, output.band) {
        (Some(score), Some(band)) => {
            let pct = score.percentage().unwrap_or(0.0);
            eprintln!(
                "{} {}  {}",
                cyan("◆"),
                bold(&band_colour(band, &format!("Score: {score}"))),
                dim(&format!("({pct:.0}%)")),
            );
            eprintln!("  {}", band_colour(band, band.label()));
        }
        (Some(score), None) => {
            eprintln!("{} {}", cyan("◆"), bold(&format!("Score: {score}")));
        }
        (None, _) => {
            eprintln!("{} {}", yellow("⚠"), dim("No score found in the report"));
        }
    }
}

/// Map CLI args to `EvaluationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EvaluationConfig> {
    let mut builder = EvaluationConfig::builder()
        .max_marks(cli.max_marks)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let rubric = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(rubric);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    Ok(config)
}

/// Map CLI args to `EvaluationInput`.
async fn build_input(cli: &Cli) -> Result<EvaluationInput> {
    let question_text = match (&cli.question_text, &cli.question_text_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read question text from {:?}", path))?,
        ),
        (None, None) => None,
    };

    if cli.question_paper.is_none() && question_text.is_none() {
        anyhow::bail!("Provide a question paper (--question-paper) or the question text (--question-text)");
    }

    Ok(EvaluationInput {
        answer_sheets: cli.answers.clone(),
        question_paper: cli.question_paper.clone(),
        question_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_goes_to_output_file_when_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("result.json");
        let value = serde_json::json!({ "report": "Overall: 7/10", "band": "Good" });

        emit_json(&value, Some(&path)).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, value);
    }

    #[test]
    fn spinner_is_cleared_when_evaluation_fails_early() {
        let cb = CliProgressCallback::new();
        cb.on_extraction_start("paper.pdf");
        assert!(!cb.bar.is_finished());

        cb.clear();
        assert!(cb.bar.is_finished());

        // A second clear after grading finished the bar is harmless.
        cb.on_grading_complete(10);
        cb.clear();
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn json_flag_accepts_output_path() {
        let cli = Cli::try_parse_from([
            "grade", "--json", "-o", "result.json", "-a", "p1.png", "--question-text", "Q1",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.output.as_deref(), Some(Path::new("result.json")));
    }
}
