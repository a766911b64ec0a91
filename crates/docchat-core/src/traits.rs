//! Core traits for docchat components.
//!
//! This module defines the trait interfaces that all docchat components implement:
//!
//! - [`ContentExtractor`]: Extract plain text from documents
//! - [`Chunker`]: Split text into chunks
//! - [`Embedder`]: Generate vector embeddings
//! - [`VectorStore`]: Store and search vectors
//! - [`Generator`]: Produce answers from prompts
//!
//! These traits enable a pluggable architecture where different implementations
//! can be swapped without changing the rest of the system.

use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

use crate::error::{ChunkError, EmbedError, ExtractError, GenerateError, StoreError};
use crate::types::{
    ChunkConfig, ChunkOutput, DocumentChunk, EmbeddingConfig, SearchQuery, SearchResult,
    StoreStats,
};

// ============================================================================
// Content Extraction
// ============================================================================

/// Trait for extracting plain text from document files.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Returns the file extensions this extractor can handle (lowercase, no dot).
    fn supported_extensions(&self) -> &[&str];

    /// Check if this extractor can handle the given file.
    fn can_extract(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_ascii_lowercase();
                self.supported_extensions().contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Extract text content from a file.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

// ============================================================================
// Chunking
// ============================================================================

/// Trait for splitting extracted text into chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Name of this chunking strategy.
    fn name(&self) -> &str;

    /// Split the text into chunks.
    async fn chunk(
        &self,
        content: &str,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed document texts for indexing.
    async fn embed_documents(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a search query (may use a different task instruction).
    async fn embed_query(
        &self,
        query: &str,
        config: &EmbeddingConfig,
    ) -> Result<Vec<f32>, EmbedError> {
        let results = self.embed_documents(&[query], config).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Response("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Trait for vector storage and session-scoped search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the store.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert or update chunks.
    async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), StoreError>;

    /// Search for similar chunks within the query's session.
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError>;

    /// Delete all chunks belonging to a session. Returns the number removed.
    async fn purge_session(&self, chat_id: Uuid) -> Result<u64, StoreError>;

    /// Delete all chunks across all sessions. Returns the number removed.
    async fn purge_all(&self) -> Result<u64, StoreError>;

    /// Count chunks belonging to a session.
    async fn count_session(&self, chat_id: Uuid) -> Result<u64, StoreError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

// ============================================================================
// Generation
// ============================================================================

/// Trait for answer generation from a composed prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}
