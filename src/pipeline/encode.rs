//! Image encoding: answer-sheet bytes → base64 `ImageData`.
//!
//! Scans are forwarded as-is. Re-encoding would only lose detail in the
//! handwriting, so the original bytes are base64-wrapped and tagged with the
//! mime type sniffed at load time.

use crate::pipeline::input::AnswerSheet;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Encode one answer sheet for the grading request.
///
/// `detail: "high"` keeps small handwriting legible for GPT-4-class models,
/// which otherwise downscale to a single 512 px tile.
pub fn encode_sheet(sheet: &AnswerSheet) -> ImageData {
    let b64 = STANDARD.encode(&sheet.bytes);
    debug!("Encoded {} → {} bytes base64", sheet.name, b64.len());

    ImageData::new(b64, sheet.mime_type).with_detail("high")
}

/// Encode every answer sheet, keeping the selection order.
pub fn encode_sheets(sheets: &[AnswerSheet]) -> Vec<ImageData> {
    sheets.iter().map(encode_sheet).collect()
}
