//! Input resolution: answer-sheet images and the question-paper PDF.
//!
//! Everything is read into memory up front. Answer sheets are small scans and
//! pdfium can parse a PDF straight from a byte slice, so no temp files are
//! needed. Answer-sheet formats are validated here, on the bytes. Question
//! papers are taken as given: whether their bytes hold a readable PDF is
//! decided by extraction, which degrades instead of failing.

use crate::error::GradeError;
use futures::future::try_join_all;
use image::ImageFormat;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Extensions accepted for answer-sheet images.
pub const ANSWER_SHEET_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One scanned answer-sheet image, immutable once selected.
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    /// File name shown in listings.
    pub name: String,
    /// `image/png` or `image/jpeg`, taken from the content.
    pub mime_type: &'static str,
    pub bytes: Arc<[u8]>,
}

impl AnswerSheet {
    /// Build from in-memory bytes, sniffing the format.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, GradeError> {
        let name = name.into();
        let bytes = bytes.into();
        let mime_type = sniff_mime(&bytes).map_err(|reason| GradeError::UnsupportedImage {
            path: PathBuf::from(&name),
            reason,
        })?;
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }
}

/// The question paper as uploaded, immutable once selected.
#[derive(Debug, Clone)]
pub struct QuestionPaper {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl QuestionPaper {
    /// Wrap uploaded bytes. The content is not checked here.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load one answer sheet from disk.
pub async fn load_answer_sheet(path: impl AsRef<Path>) -> Result<AnswerSheet, GradeError> {
    let path = path.as_ref();

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ANSWER_SHEET_EXTENSIONS.contains(&ext.as_str()) {
        return Err(GradeError::UnsupportedImage {
            path: path.to_path_buf(),
            reason: format!("extension '{ext}'"),
        });
    }

    let bytes = read_file(path).await?;
    let sheet = AnswerSheet::from_bytes(display_name(path), bytes).map_err(|e| match e {
        GradeError::UnsupportedImage { reason, .. } => GradeError::UnsupportedImage {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })?;

    debug!(
        "Loaded answer sheet {} ({}, {} bytes)",
        path.display(),
        sheet.mime_type,
        sheet.bytes.len()
    );
    Ok(sheet)
}

/// Load several answer sheets concurrently, keeping the given order.
pub async fn load_answer_sheets<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<AnswerSheet>, GradeError> {
    try_join_all(paths.iter().map(|p| load_answer_sheet(p.as_ref()))).await
}

/// Load the question paper from a local path or an HTTP/HTTPS URL.
pub async fn load_question_paper(source: &str, timeout_secs: u64) -> Result<QuestionPaper, GradeError> {
    if source.trim().is_empty() {
        return Err(GradeError::InvalidInput {
            input: source.to_string(),
        });
    }

    if is_url(source) {
        download_url(source, timeout_secs).await
    } else {
        let path = PathBuf::from(source);
        let bytes = read_file(&path).await?;
        debug!("Loaded question paper {} ({} bytes)", path.display(), bytes.len());
        Ok(QuestionPaper::from_bytes(display_name(&path), bytes))
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, GradeError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => GradeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        ErrorKind::NotFound => GradeError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => GradeError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })
}

/// Map the content of an image to its mime type; only PNG and JPEG pass.
fn sniff_mime(bytes: &[u8]) -> Result<&'static str, String> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(other) => Err(format!("content is {:?}", other)),
        Err(_) => Err("content is not a recognised image".to_string()),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Download a question paper into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<QuestionPaper, GradeError> {
    info!("Downloading question paper from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GradeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            GradeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            GradeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(GradeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| GradeError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let name = filename_from_url(url);
    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(QuestionPaper::from_bytes(name, &bytes[..]))
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "question-paper.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn tiny_image(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([250, 250, 250])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/paper.pdf"));
        assert!(is_url("http://example.com/paper.pdf"));
        assert!(!is_url("/tmp/paper.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(filename_from_url("https://school.test/exams/term1.pdf"), "term1.pdf");
        assert_eq!(filename_from_url("https://school.test/exams/"), "question-paper.pdf");
    }

    #[test]
    fn mime_comes_from_content() {
        assert_eq!(sniff_mime(&tiny_image(ImageFormat::Png)), Ok("image/png"));
        assert_eq!(sniff_mime(&tiny_image(ImageFormat::Jpeg)), Ok("image/jpeg"));
        assert!(sniff_mime(b"%PDF-1.4").is_err());
    }

    #[tokio::test]
    async fn jpeg_named_png_is_tagged_as_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page1.png");
        std::fs::write(&path, tiny_image(ImageFormat::Jpeg)).unwrap();

        let sheet = load_answer_sheet(&path).await.unwrap();
        assert_eq!(sheet.name, "page1.png");
        assert_eq!(sheet.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let err = load_answer_sheet(&path).await.unwrap_err();
        assert!(matches!(err, GradeError::UnsupportedImage { .. }));
    }

    #[tokio::test]
    async fn missing_answer_sheet_is_file_not_found() {
        let err = load_answer_sheet("/definitely/not/here.jpg").await.unwrap_err();
        assert!(matches!(err, GradeError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn answer_sheets_keep_their_order() {
        let dir = tempfile::tempdir().unwrap();
        let names = ["c.png", "a.jpg", "b.jpeg"];
        let mut paths = Vec::new();
        for name in names {
            let p = dir.path().join(name);
            let fmt = if name.ends_with(".png") { ImageFormat::Png } else { ImageFormat::Jpeg };
            std::fs::write(&p, tiny_image(fmt)).unwrap();
            paths.push(p);
        }

        let sheets = load_answer_sheets(&paths).await.unwrap();
        let loaded: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(loaded, names);
    }

    #[tokio::test]
    async fn question_paper_content_is_not_judged_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"PK\x03\x04 not really a pdf").unwrap();

        let paper = load_question_paper(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(paper.name, "paper.pdf");
        assert!(paper.bytes.starts_with(b"PK"));
    }

    #[test]
    fn answer_sheet_from_bytes_sniffs_format() {
        let sheet = AnswerSheet::from_bytes("upload", tiny_image(ImageFormat::Png)).unwrap();
        assert_eq!(sheet.mime_type, "image/png");

        let err = AnswerSheet::from_bytes("notes.txt", &b"plain text"[..]).unwrap_err();
        match err {
            GradeError::UnsupportedImage { path, .. } => assert_eq!(path, PathBuf::from("notes.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unsupported_sheet_error_names_full_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"GIF89a disguised").unwrap();

        match load_answer_sheet(&path).await.unwrap_err() {
            GradeError::UnsupportedImage { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn question_paper_local_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("term1.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").unwrap();

        let paper = load_question_paper(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(paper.name, "term1.pdf");
        assert!(paper.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_source_is_invalid_input() {
        let err = tokio_test::block_on(load_question_paper("  ", 5)).unwrap_err();
        assert!(matches!(err, GradeError::InvalidInput { .. }));
    }
}
