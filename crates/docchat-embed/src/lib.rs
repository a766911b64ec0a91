//! # docchat-embed
//!
//! Embedding generation for the docchat retrieval pipeline.
//!
//! This crate provides vector embeddings via the Gemini embedding API, plus a
//! deterministic hashing embedder for tests and offline development.
//!
//! ## Model Details
//!
//! | Property | Value |
//! |----------|-------|
//! | Model | `models/embedding-001` |
//! | Dimension | 768 |
//! | Document task type | `RETRIEVAL_DOCUMENT` |
//! | Query task type | `RETRIEVAL_QUERY` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docchat_embed::GeminiEmbedder;
//! use docchat_core::{Embedder, EmbeddingConfig};
//!
//! let embedder = GeminiEmbedder::new(&api_key)?;
//!
//! // Embed documents for indexing
//! let config = EmbeddingConfig::default();
//! let texts = vec!["Hello world", "Machine learning"];
//! let embeddings = embedder.embed_documents(&texts, &config).await?;
//! // Each embedding is a Vec<f32> with 768 dimensions
//!
//! // Embed a query for retrieval
//! let query_vector = embedder.embed_query("what is machine learning?", &config).await?;
//! ```
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GeminiEmbedder`] | Hosted embeddings via the Gemini API |
//! | [`HashingEmbedder`] | Deterministic token-hash embeddings for tests and offline use |

pub mod gemini;
pub mod hashing;

pub use gemini::{GeminiEmbedder, DEFAULT_EMBEDDING_DIM, DEFAULT_EMBEDDING_MODEL};
pub use hashing::HashingEmbedder;
