//! PDF content extractor.
//!
//! Uses pdf-extract to pull text content; parsing runs on a blocking thread.

use async_trait::async_trait;
use docchat_core::{ContentExtractor, ExtractError};
use std::path::Path;
use tracing::debug;

/// Extractor for PDF files.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        // pdf-extract is a blocking parser
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))?
            .map_err(|e| ExtractError::Parse(format!("PDF extraction failed: {e}")))?;

        Ok(normalize_page_breaks(&text))
    }
}

/// Extract text from PDF bytes using pdf-extract.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())
}

/// Replace form feed page breaks with blank lines so page boundaries
/// become paragraph boundaries for the chunker.
fn normalize_page_breaks(text: &str) -> String {
    text.replace('\x0C', "\n\n")
}
