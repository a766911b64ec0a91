//! # docchat-core
//!
//! Core types and traits for the docchat retrieval-augmented chat project.
//!
//! This crate provides the foundational abstractions used throughout docchat:
//!
//! - **Content Extraction**: [`ContentExtractor`] trait for extracting text from documents
//! - **Document Chunking**: [`Chunker`] trait for splitting text into searchable chunks
//! - **Embedding Generation**: [`Embedder`] trait for converting text to vector embeddings
//! - **Vector Storage**: [`VectorStore`] trait for storing and searching embeddings per session
//! - **Answer Generation**: [`Generator`] trait for producing answers from composed prompts
//!
//! ## Architecture
//!
//! The crate is organized around two pipelines that share a vector store:
//!
//! ```text
//! Document → ContentExtractor → Chunker → Embedder → VectorStore
//!                                                        ↓
//! Question → Embedder → SearchQuery → SearchResult → Generator → Answer
//! ```
//!
//! Every chunk is tagged with the chat session that uploaded it, and every
//! search is filtered to a single session.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Chat`] | A conversation session |
//! | [`Message`] | A single turn in a conversation |
//! | [`DocumentChunk`] | A segment of an uploaded document with its embedding |
//! | [`SearchQuery`] | Parameters for a session-scoped vector search |
//! | [`SearchResult`] | A matching chunk with similarity score |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ContentExtractor`] | Extract plain text from document files |
//! | [`Chunker`] | Split extracted text into chunks |
//! | [`Embedder`] | Generate vector embeddings |
//! | [`VectorStore`] | Store and search vector embeddings |
//! | [`Generator`] | Produce answers from prompts |
//!
//! ## Example
//!
//! ```rust,ignore
//! use docchat_core::{ContentExtractor, Chunker, Embedder, VectorStore};
//! use docchat_core::{ChunkConfig, DocumentChunk, EmbeddingConfig};
//!
//! // Components implement these traits
//! async fn attach_document(
//!     extractor: &impl ContentExtractor,
//!     chunker: &impl Chunker,
//!     embedder: &impl Embedder,
//!     store: &impl VectorStore,
//!     chat_id: Uuid,
//!     path: &Path,
//! ) -> Result<(), Error> {
//!     // 1. Extract text
//!     let text = extractor.extract(path).await?;
//!
//!     // 2. Chunk the text
//!     let chunks = chunker.chunk(&text, &ChunkConfig::default()).await?;
//!
//!     // 3. Generate embeddings
//!     let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
//!     let embeddings = embedder.embed_documents(&texts, &EmbeddingConfig::default()).await?;
//!
//!     // 4. Store session-tagged chunks in the vector database
//!     // ... create DocumentChunk structs with embeddings and store
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! This crate has no optional features.
//!
//! ## Related Crates
//!
//! - `docchat-extract`: Content extraction implementations
//! - `docchat-chunker`: Chunking strategy implementations
//! - `docchat-embed`: Embedding generation via the Gemini API
//! - `docchat-store`: `LanceDB` vector storage implementation
//! - `docchat-persist`: `SQLite` conversation storage
//! - `docchat-llm`: Answer generation via the Gemini API
//! - `docchat-engine`: Chat orchestration

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ChunkError, EmbedError, Error, ExtractError, GenerateError, PersistError, Result, StoreError,
};
pub use traits::*;
pub use types::*;
