//! Recursive character chunking with overlap.
//!
//! Splits text into chunks of at most `target_size` characters where
//! consecutive chunks share `overlap` characters. Chunk boundaries prefer
//! natural breakpoints in order: paragraph break, line break, sentence end,
//! word boundary, then a hard character cut.

use async_trait::async_trait;
use docchat_core::{ChunkConfig, ChunkError, ChunkOutput, Chunker};

/// Recursive character chunker with configurable overlap.
pub struct RecursiveChunker;

impl RecursiveChunker {
    /// Create a new recursive chunker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chunker for RecursiveChunker {
    fn name(&self) -> &str {
        "recursive_character"
    }

    async fn chunk(
        &self,
        content: &str,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError> {
        if config.target_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "target_size must be greater than zero".to_string(),
            ));
        }
        if config.overlap >= config.target_size {
            return Err(ChunkError::InvalidConfig(format!(
                "overlap ({}) must be smaller than target_size ({})",
                config.overlap, config.target_size
            )));
        }

        if content.is_empty() {
            return Ok(vec![]);
        }

        let chars: Vec<char> = content.chars().collect();
        let total = chars.len();
        let target = config.target_size;
        let overlap = config.overlap;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let ideal_end = start + target;
            if ideal_end >= total {
                chunks.push(make_output(&chars, start, total));
                break;
            }

            let end = find_break_point(&chars, start, ideal_end, total);
            chunks.push(make_output(&chars, start, end));

            // Back up by the overlap so consecutive chunks share it.
            // The max guard keeps progress for degenerate configs.
            start = end.saturating_sub(overlap).max(start + 1);
        }

        Ok(chunks)
    }
}

fn make_output(chars: &[char], start: usize, end: usize) -> ChunkOutput {
    ChunkOutput {
        content: chars[start..end].iter().collect(),
        char_range: start..end,
    }
}

/// Find the best chunk end in the window leading up to `target_end`.
///
/// The window spans the last fifth of the chunk, so even a hard cut never
/// produces a chunk above the target size.
fn find_break_point(chars: &[char], start: usize, target_end: usize, total: usize) -> usize {
    if target_end >= total {
        return total;
    }

    let span = target_end - start;
    let search_start = (target_end.saturating_sub(span / 5)).max(start + 1);

    // Paragraph break: chunk ends just after a blank line
    for end in (search_start..=target_end).rev() {
        if end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n' {
            return end;
        }
    }

    // Line break
    for end in (search_start..=target_end).rev() {
        if chars[end - 1] == '\n' {
            return end;
        }
    }

    // Sentence end followed by whitespace
    for end in (search_start..=target_end).rev() {
        let c = chars[end - 1];
        if (c == '.' || c == '!' || c == '?') && chars[end].is_whitespace() {
            return end;
        }
    }

    // Word boundary
    for end in (search_start..=target_end).rev() {
        if chars[end - 1].is_whitespace() {
            return end;
        }
    }

    // Hard cut, e.g. one very long unbroken token
    target_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target_size: usize, overlap: usize) -> ChunkConfig {
        ChunkConfig {
            target_size,
            overlap,
        }
    }

    /// Shared characters between the end of `a` and the start of `b`.
    fn shared_boundary(a: &ChunkOutput, b: &ChunkOutput) -> usize {
        a.char_range.end.saturating_sub(b.char_range.start)
    }

    #[tokio::test]
    async fn test_chunk_empty_text() {
        let chunker = RecursiveChunker::new();
        let chunks = chunker.chunk("", &ChunkConfig::default()).await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_chunk_short_text_single_chunk() {
        let chunker = RecursiveChunker::new();
        let text = "This is a short text.";
        let chunks = chunker.chunk(text, &ChunkConfig::default()).await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].char_range, 0..text.chars().count());
    }

    #[tokio::test]
    async fn test_text_at_exactly_target_size_single_chunk() {
        let chunker = RecursiveChunker::new();
        let text = "x".repeat(1000);
        let chunks = chunker.chunk(&text, &config(1000, 200)).await.unwrap();

        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_500_chars_under_default_config_single_chunk() {
        let chunker = RecursiveChunker::new();
        let text = "word ".repeat(100);
        assert_eq!(text.chars().count(), 500);

        let chunks = chunker.chunk(&text, &ChunkConfig::default()).await.unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_long_text_produces_multiple_chunks() {
        let chunker = RecursiveChunker::new();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(60);
        let chunks = chunker.chunk(&text, &config(1000, 200)).await.unwrap();

        assert!(chunks.len() > 1, "expected multiple chunks");
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 1000);
        }
    }

    #[tokio::test]
    async fn test_consecutive_chunks_share_overlap() {
        let chunker = RecursiveChunker::new();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(60);
        let overlap = 200;
        let chunks = chunker.chunk(&text, &config(1000, overlap)).await.unwrap();

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert!(
                shared_boundary(&pair[0], &pair[1]) >= overlap,
                "chunks {:?} and {:?} share less than {overlap} chars",
                pair[0].char_range,
                pair[1].char_range
            );
        }
    }

    #[tokio::test]
    async fn test_overlap_content_matches() {
        let chunker = RecursiveChunker::new();
        let text = "alpha beta gamma delta epsilon zeta. ".repeat(50);
        let chunks = chunker.chunk(&text, &config(300, 50)).await.unwrap();

        assert!(chunks.len() > 1);
        let first = &chunks[0];
        let second = &chunks[1];
        let shared = shared_boundary(first, second);
        assert!(shared >= 50);

        let first_chars: Vec<char> = first.content.chars().collect();
        let second_chars: Vec<char> = second.content.chars().collect();
        let tail: String = first_chars[first_chars.len() - shared..].iter().collect();
        let head: String = second_chars[..shared].iter().collect();
        assert_eq!(tail, head);
    }

    #[tokio::test]
    async fn test_chunks_cover_whole_text() {
        let chunker = RecursiveChunker::new();
        let text = "lorem ipsum dolor sit amet consectetur. ".repeat(80);
        let total = text.chars().count();
        let chunks = chunker.chunk(&text, &config(800, 100)).await.unwrap();

        assert_eq!(chunks[0].char_range.start, 0);
        assert_eq!(chunks.last().unwrap().char_range.end, total);
        for pair in chunks.windows(2) {
            assert!(pair[1].char_range.start <= pair[0].char_range.end);
        }
    }

    #[tokio::test]
    async fn test_prefers_paragraph_breaks() {
        let chunker = RecursiveChunker::new();
        let text = format!(
            "{}\n\n{}",
            "First paragraph sentence here. ".repeat(6),
            "Second paragraph sentence here. ".repeat(20)
        );
        let chunks = chunker.chunk(&text, &config(200, 20)).await.unwrap();

        assert!(chunks.len() > 1);
        let has_paragraph_break = chunks
            .iter()
            .take(chunks.len() - 1)
            .any(|c| c.content.ends_with("\n\n"));
        assert!(has_paragraph_break);
    }

    #[tokio::test]
    async fn test_prefers_sentence_break_over_word() {
        let chunker = RecursiveChunker::new();
        // 29-char sentences, no newlines; a sentence end lands in the
        // search window of the first chunk
        let text = "This is sentence number one. ".repeat(20);
        let chunks = chunker.chunk(&text, &config(100, 10)).await.unwrap();

        assert!(chunks.len() > 1);
        assert!(chunks[0].content.ends_with('.'));
    }

    #[tokio::test]
    async fn test_hard_cut_for_unbroken_text() {
        let chunker = RecursiveChunker::new();
        let text = "x".repeat(2500);
        let chunks = chunker.chunk(&text, &config(1000, 200)).await.unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 1000);
        }
        assert_eq!(chunks.last().unwrap().char_range.end, 2500);
    }

    #[tokio::test]
    async fn test_unicode_boundaries() {
        let chunker = RecursiveChunker::new();
        let text = "мир 世界 🌍 ".repeat(100);
        let chunks = chunker.chunk(&text, &config(50, 10)).await.unwrap();

        assert!(chunks.len() > 1);
        let reconstructed: String = chunks[0].content.clone();
        assert!(!reconstructed.is_empty());
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 50);
        }
    }

    #[tokio::test]
    async fn test_zero_target_size_rejected() {
        let chunker = RecursiveChunker::new();
        let result = chunker.chunk("text", &config(0, 0)).await;
        assert!(matches!(result, Err(ChunkError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_overlap_not_smaller_than_target_rejected() {
        let chunker = RecursiveChunker::new();
        let result = chunker.chunk("text", &config(100, 100)).await;
        assert!(matches!(result, Err(ChunkError::InvalidConfig(_))));

        let result = chunker.chunk("text", &config(100, 150)).await;
        assert!(matches!(result, Err(ChunkError::InvalidConfig(_))));
    }

    #[test]
    fn test_chunker_name() {
        let chunker = RecursiveChunker::new();
        assert_eq!(chunker.name(), "recursive_character");
    }

    #[test]
    fn test_find_break_point_at_end() {
        let chars: Vec<char> = "Hello world".chars().collect();
        let result = find_break_point(&chars, 0, 20, chars.len());
        assert_eq!(result, chars.len());
    }

    #[test]
    fn test_find_break_point_paragraph_wins() {
        let chars: Vec<char> = "aa bb.\n\ncc dd".chars().collect();
        // Window is [8, 10]; the blank line ending at 8 wins
        let result = find_break_point(&chars, 0, 10, chars.len());
        assert_eq!(result, 8);
    }

    #[test]
    fn test_find_break_point_word_boundary() {
        let chars: Vec<char> = "alpha beta gamma delta".chars().collect();
        let result = find_break_point(&chars, 0, 12, chars.len());
        // No newline or sentence end; break after "beta "
        assert_eq!(result, 11);
    }
}
