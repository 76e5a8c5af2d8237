//! Text Extractor: turns uploaded document bytes into plain text.
//!
//! Dispatch is strictly by filename suffix (case-insensitive). Parsing is
//! CPU-bound, so async callers go through [`extract_text_blocking`].

pub mod docx;
pub mod pdf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to extract text: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
}

impl DocumentKind {
    /// Resolves the document kind from the filename suffix.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else if lower.ends_with(".docx") || lower.ends_with(".doc") {
            Some(DocumentKind::Word)
        } else {
            None
        }
    }
}

/// Extracts plain text from `bytes`, choosing the parser by `filename`'s suffix.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
    match DocumentKind::from_filename(filename) {
        Some(DocumentKind::Pdf) => pdf::extract_pdf_text(bytes),
        Some(DocumentKind::Word) => docx::extract_docx_text(bytes),
        None => Err(ExtractionError::UnsupportedFileType(filename.to_string())),
    }
}

/// Runs [`extract_text`] on the blocking thread pool.
pub async fn extract_text_blocking(
    bytes: Vec<u8>,
    filename: String,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, &filename))
        .await
        .map_err(|e| ExtractionError::ExtractionFailed(format!("extraction task failed: {e}")))?
}
