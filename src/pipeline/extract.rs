//! Question-paper text extraction: PDF bytes → one plain-text string.
//!
//! Each page's text segments are joined with a single space and the page is
//! terminated with `\n`, so an N-page document always yields exactly N
//! newline-terminated segments and a zero-page document yields `""`.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to drive
//! from async contexts. [`extract_text`] moves the whole document walk onto
//! the blocking pool and the caller awaits every page before continuing.

use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Plain text of a PDF, one entry per page in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pages: Vec<String>,
}

impl ExtractedText {
    /// Build from the raw text items of each page.
    pub fn from_page_items<P, S>(pages: impl IntoIterator<Item = P>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            pages: pages.into_iter().map(join_items).collect(),
        }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True for a document without pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The concatenated form: every page followed by `\n`.
    pub fn into_string(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for page in &self.pages {
            f.write_str(page)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}

/// Join the text items of one page with single spaces.
pub fn join_items<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> String {
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(item.as_ref());
    }
    out
}

/// How far into the payload the `%PDF` header may start.
pub const PDF_HEADER_WINDOW: usize = 1024;

/// Reject payloads whose `%PDF` header does not start within the first
/// [`PDF_HEADER_WINDOW`] bytes before pdfium sees them.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), ExtractionError> {
    let head = &bytes[..bytes.len().min(PDF_HEADER_WINDOW + 3)];
    if head.windows(4).any(|w| w == b"%PDF") {
        Ok(())
    } else {
        Err(ExtractionError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Bind a pdfium library.
///
/// Tried in order: `library_path` (a directory or the library file itself),
/// `PDFIUM_LIB_PATH`, the working directory, then the system library path.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, ExtractionError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = library_path {
        candidates.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        if !p.is_empty() {
            candidates.push(PathBuf::from(p));
        }
    }
    candidates.push(PathBuf::from("./"));

    let mut last_err = String::from("no candidate paths");
    for candidate in &candidates {
        let lib = if candidate.is_file() {
            candidate.clone()
        } else {
            Pdfium::pdfium_platform_library_name_at_path(candidate)
        };
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", lib.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => last_err = format!("{}: {:?}", lib.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ExtractionError::EngineUnavailable(format!("{last_err}; system: {e:?}")))
}

/// Extract the text of every page of `bytes`.
///
/// Runs on the blocking pool. A single attempt; the caller decides what to do
/// with a failure (the session degrades to empty question text).
pub async fn extract_text(
    bytes: Arc<[u8]>,
    library_path: Option<PathBuf>,
) -> Result<ExtractedText, ExtractionError> {
    check_pdf_magic(&bytes)?;

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(library_path.as_deref())?;
        extract_text_blocking(&pdfium, &bytes)
    })
    .await
    .map_err(|e| ExtractionError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_text`] against an already-bound engine.
pub fn extract_text_blocking(pdfium: &Pdfium, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    check_pdf_magic(bytes)?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ExtractionError::PasswordRequired
        } else {
            ExtractionError::Unreadable { detail: err_str }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut page_items: Vec<Vec<String>> = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| ExtractionError::PageText {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;

        let items: Vec<String> = text.segments().iter().map(|segment| segment.text()).collect();
        debug!("Page {}: {} text items", idx + 1, items.len());
        page_items.push(items);
    }

    Ok(ExtractedText::from_page_items(page_items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_joined_with_single_spaces() {
        assert_eq!(join_items(["Q1.", "Define", "osmosis."]), "Q1. Define osmosis.");
        assert_eq!(join_items(Vec::<String>::new()), "");
    }

    #[test]
    fn every_page_is_newline_terminated() {
        let text = ExtractedText::from_page_items(vec![
            vec!["Section A", "Q1"],
            vec!["Q2"],
            vec!["Section B", "Q3", "(5 marks)"],
        ]);
        let s = text.to_string();
        assert_eq!(s, "Section A Q1\nQ2\nSection B Q3 (5 marks)\n");
        assert_eq!(s.matches('\n').count(), text.page_count());
    }

    #[test]
    fn zero_pages_is_empty_string() {
        let text = ExtractedText::from_page_items(Vec::<Vec<&str>>::new());
        assert!(text.is_empty());
        assert_eq!(text.into_string(), "");
    }

    #[test]
    fn page_without_items_contributes_only_newline() {
        let text = ExtractedText::from_page_items(vec![vec!["Q1"], vec![], vec!["Q3"]]);
        assert_eq!(text.to_string(), "Q1\n\nQ3\n");
    }

    #[test]
    fn many_pages_are_not_truncated() {
        let pages: Vec<Vec<String>> = (1..=500).map(|n| vec![format!("page {n}")]).collect();
        let s = ExtractedText::from_page_items(pages).into_string();
        assert_eq!(s.lines().count(), 500);
        assert!(s.ends_with("page 500\n"));
    }

    #[test]
    fn magic_bytes_are_checked() {
        assert!(check_pdf_magic(b"%PDF-1.7\n...").is_ok());
        assert!(check_pdf_magic(b"\n%PDF-1.4\n%%EOF\n").is_ok());

        let mut late = vec![b' '; PDF_HEADER_WINDOW];
        late.extend_from_slice(b"%PDF-1.4");
        assert!(check_pdf_magic(&late).is_err());
        late.remove(0);
        assert!(check_pdf_magic(&late).is_ok());
        assert_eq!(
            check_pdf_magic(b"PK\x03\x04rest"),
            Err(ExtractionError::NotAPdf {
                magic: b"PK\x03\x04".to_vec()
            })
        );
        assert_eq!(
            check_pdf_magic(b""),
            Err(ExtractionError::NotAPdf { magic: vec![] })
        );
    }

    /// A pdfium binding, or None (with a note) when no library is installed.
    fn pdfium_or_skip() -> Option<Pdfium> {
        match bind_pdfium(None) {
            Ok(pdfium) => Some(pdfium),
            Err(e) => {
                println!("SKIP — pdfium not available: {e}");
                None
            }
        }
    }

    fn blank_pdf(pdfium: &Pdfium, pages: usize) -> Vec<u8> {
        let mut document = pdfium.create_new_pdf().unwrap();
        for _ in 0..pages {
            document
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::a4())
                .unwrap();
        }
        document.save_to_bytes().unwrap()
    }

    #[test]
    fn blank_pages_extract_to_one_newline_each() {
        let Some(pdfium) = pdfium_or_skip() else { return };
        let bytes = blank_pdf(&pdfium, 3);

        let first = extract_text_blocking(&pdfium, &bytes).unwrap();
        assert_eq!(first.page_count(), 3);
        assert_eq!(first.pages(), ["", "", ""]);
        assert_eq!(first.to_string(), "\n\n\n");

        let second = extract_text_blocking(&pdfium, &bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_page_pdf_extracts_to_empty_string() {
        let Some(pdfium) = pdfium_or_skip() else { return };
        let bytes = blank_pdf(&pdfium, 0);
        let text = extract_text_blocking(&pdfium, &bytes).unwrap();
        assert!(text.is_empty());
        assert_eq!(text.into_string(), "");
    }

    #[test]
    fn truncated_pdf_is_unreadable() {
        let Some(pdfium) = pdfium_or_skip() else { return };
        let err = extract_text_blocking(&pdfium, b"%PDF-1.4\n% cut off here").unwrap_err();
        assert!(matches!(err, ExtractionError::Unreadable { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn non_pdf_fails_before_binding_pdfium() {
        let bytes: Arc<[u8]> = Arc::from(&b"GIF89a"[..]);
        let err = extract_text(bytes, None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NotAPdf { .. }));
    }
}
