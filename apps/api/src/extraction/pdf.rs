use std::panic::{self, AssertUnwindSafe};

use super::ExtractionError;

/// Extracts text page by page, skipping pages with no text, joined by newlines.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractionError::ExtractionFailed("PDF parser panicked".to_string()))?
    .map_err(|e| ExtractionError::ExtractionFailed(e.to_string()))?;

    Ok(join_pages(pages))
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
