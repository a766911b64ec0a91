//! DOCX content extractor.
//!
//! A `.docx` file is a ZIP archive; the document body lives in
//! `word/document.xml`. Text is collected from `w:t` elements, with one
//! output paragraph per `w:p` element, paragraphs joined by blank lines.

use async_trait::async_trait;
use docchat_core::{ContentExtractor, ExtractError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// Extractor for DOCX files.
pub struct DocxExtractor;

impl DocxExtractor {
    /// Create a new DOCX extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for DocxExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting DOCX: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        // ZIP and XML parsing are blocking
        let text = tokio::task::spawn_blocking(move || extract_docx_text(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))?
            .map_err(ExtractError::Parse)?;

        Ok(text)
    }
}

/// Extract paragraph text from DOCX bytes.
fn extract_docx_text(bytes: &[u8]) -> Result<String, String> {
    let cursor = Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| format!("not a valid DOCX archive: {e}"))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {e}"))?
        .read_to_string(&mut document_xml)
        .map_err(|e| format!("failed to read document.xml: {e}"))?;

    parse_document_xml(&document_xml)
}

/// Walk the WordprocessingML body collecting `w:t` text per `w:p` paragraph.
fn parse_document_xml(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let trimmed = current.trim();
                    if !trimmed.is_empty() {
                        paragraphs.push(trimmed.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"br" | b"cr" => current.push('\n'),
                b"tab" => current.push('\t'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e
                        .unescape()
                        .map_err(|err| format!("invalid XML text: {err}"))?;
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML parse error at position {}: {e}",
                    reader.buffer_position()
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if !current.trim().is_empty() {
        paragraphs.push(current.trim().to_string());
    }

    Ok(paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build an in-memory DOCX containing the given document.xml body.
    fn make_docx(document_xml: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    const SIMPLE_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Third paragraph.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_supported_extensions() {
        let extractor = DocxExtractor::new();
        assert_eq!(extractor.supported_extensions(), &["docx"]);
    }

    #[test]
    fn test_can_extract_docx() {
        let extractor = DocxExtractor::new();
        assert!(extractor.can_extract(Path::new("/test/report.docx")));
        assert!(!extractor.can_extract(Path::new("/test/report.doc")));
    }

    #[test]
    fn test_parse_paragraphs() {
        let docx = make_docx(SIMPLE_DOC);
        let text = extract_docx_text(&docx).unwrap();

        assert_eq!(
            text,
            "First paragraph.\n\nSecond paragraph.\n\nThird paragraph."
        );
    }

    #[test]
    fn test_parse_split_runs_are_joined() {
        let docx = make_docx(SIMPLE_DOC);
        let text = extract_docx_text(&docx).unwrap();

        assert!(text.contains("Second paragraph."));
    }

    #[test]
    fn test_parse_line_break_within_paragraph() {
        let doc = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>line one</w:t><w:br/><w:t>line two</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let docx = make_docx(doc);
        let text = extract_docx_text(&docx).unwrap();

        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_parse_escaped_entities() {
        let doc = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Fish &amp; chips &lt;today&gt;</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let docx = make_docx(doc);
        let text = extract_docx_text(&docx).unwrap();

        assert_eq!(text, "Fish & chips <today>");
    }

    #[test]
    fn test_empty_body_yields_empty_string() {
        let doc = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body/>
</w:document>"#;
        let docx = make_docx(doc);
        let text = extract_docx_text(&docx).unwrap();

        assert_eq!(text, "");
    }

    #[test]
    fn test_not_a_zip_fails() {
        let result = extract_docx_text(b"plain text, not a zip");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not a valid DOCX archive"));
    }

    #[test]
    fn test_zip_without_document_xml_fails() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("unrelated.txt", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"hello").unwrap();
            writer.finish().unwrap();
        }
        let result = extract_docx_text(&cursor.into_inner());

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("missing word/document.xml"));
    }

    #[tokio::test]
    async fn test_extract_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("doc.docx");
        std::fs::write(&file_path, make_docx(SIMPLE_DOC)).unwrap();

        let extractor = DocxExtractor::new();
        let text = extractor.extract(&file_path).await.unwrap();

        assert!(text.starts_with("First paragraph."));
        assert!(text.ends_with("Third paragraph."));
    }

    #[tokio::test]
    async fn test_extract_invalid_file_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("broken.docx");
        std::fs::write(&file_path, b"garbage").unwrap();

        let extractor = DocxExtractor::new();
        let result = extractor.extract(&file_path).await;

        assert!(matches!(result, Err(ExtractError::Parse(_))));
    }
}
