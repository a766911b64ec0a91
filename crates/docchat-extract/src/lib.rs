//! # docchat-extract
//!
//! Document text extraction for the docchat indexing pipeline.
//!
//! This crate provides the extraction layer that reads uploaded files and
//! produces plain text for downstream chunking and embedding.
//!
//! ## Supported Formats
//!
//! | Extractor | Formats | Notes |
//! |-----------|---------|-------|
//! | [`TextExtractor`] | `.txt`, `.md`, `.markdown`, `.text` | UTF-8 text; Markdown kept verbatim |
//! | [`PdfExtractor`] | `.pdf` | Text extraction, page breaks become blank lines |
//! | [`DocxExtractor`] | `.docx` | Paragraph text from `word/document.xml` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docchat_extract::{DocxExtractor, ExtractorRegistry, PdfExtractor, TextExtractor};
//! use std::path::Path;
//!
//! // Create a registry with all extractors
//! let mut registry = ExtractorRegistry::new();
//! registry.register("text", TextExtractor::new());
//! registry.register("pdf", PdfExtractor::new());
//! registry.register("docx", DocxExtractor::new());
//!
//! // Extract text from a file
//! let text = registry.extract(Path::new("document.pdf")).await?;
//! println!("Extracted {} chars", text.len());
//! ```
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ExtractorRegistry`] | Routes files to extractors by file extension |
//! | [`TextExtractor`] | Plain text and Markdown files |
//! | [`PdfExtractor`] | PDF text extraction via pdf-extract |
//! | [`DocxExtractor`] | DOCX paragraph extraction via zip + quick-xml |

pub mod docx;
pub mod pdf;
pub mod registry;
pub mod text;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use text::TextExtractor;
