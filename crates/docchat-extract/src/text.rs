//! Plain text content extractor.

use async_trait::async_trait;
use docchat_core::{ContentExtractor, ExtractError};
use std::path::Path;
use tokio::fs;

/// Extractor for plain text and Markdown files.
///
/// Markdown is treated as plain text: headings, lists and inline markup are
/// kept verbatim and flow into the chunker unchanged.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown", "text"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }
}
