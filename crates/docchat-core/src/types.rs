//! Core types for docchat.
//!
//! This module contains the shared data structures used across docchat:
//!
//! ## Conversations
//! - [`Chat`]: A conversation session with title and timestamps
//! - [`Message`]: A single transcript entry belonging to a chat
//! - [`Role`]: Author of a message (user, assistant, system)
//!
//! ## Document Chunks
//! - [`DocumentChunk`]: A passage of an uploaded document with its embedding
//! - [`ChunkConfig`]: Configuration for chunking behavior
//! - [`ChunkOutput`]: Raw splitter output before embedding
//!
//! ## Search
//! - [`SearchQuery`]: Parameters for a session-scoped vector search
//! - [`SearchResult`]: A matching passage with similarity score
//! - [`StoreStats`]: Aggregate vector store statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use uuid::Uuid;

// ============================================================================
// Conversations
// ============================================================================

/// A chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Unique chat identifier
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last activity time (bumped on every message append and rename)
    pub updated_at: DateTime<Utc>,
}

/// Default title for a freshly created chat.
pub const DEFAULT_CHAT_TITLE: &str = "Untitled";

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Question or command typed by the person chatting
    User,
    /// Answer produced by the generation provider
    Assistant,
    /// Notice emitted by the application itself (e.g. document processed)
    System,
}

impl Role {
    /// Storage representation, stable across schema versions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse the storage representation back into a role.
    #[must_use]
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Row identifier, monotonically increasing within the store
    pub id: i64,
    /// Owning chat
    pub chat_id: Uuid,
    /// Author
    pub role: Role,
    /// Text content, immutable once written
    pub content: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Document Chunks
// ============================================================================

/// A passage of an uploaded document, tagged with its owning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique entry identifier, `"{chat_id}_{uuid}"`
    pub id: String,
    /// Owning chat session; every query must filter on this tag
    pub chat_id: Uuid,
    /// Position of this chunk within its source document (0-indexed)
    pub chunk_index: u32,
    /// Name of the uploaded file this passage came from
    pub filename: String,
    /// The passage text
    pub content: String,
    /// Embedding vector (if computed)
    pub embedding: Option<Vec<f32>>,
    /// Embedding model used
    pub embedding_model: Option<String>,
    /// When the chunk was indexed
    pub indexed_at: Option<DateTime<Utc>>,
}

impl DocumentChunk {
    /// Generate the canonical entry id for a session-tagged chunk.
    #[must_use]
    pub fn new_id(chat_id: Uuid) -> String {
        format!("{chat_id}_{}", Uuid::new_v4())
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// Configuration for chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target chunk size in characters; no chunk exceeds this unless a
    /// single unsplittable unit is longer
    pub target_size: usize,
    /// Characters shared between consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_size: 1000,
            overlap: 200,
        }
    }
}

/// Output from a chunker.
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    /// Chunk content
    pub content: String,
    /// Character range in the source text
    pub char_range: Range<usize>,
}

// ============================================================================
// Embedding
// ============================================================================

/// Configuration for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Number of texts sent to the provider per request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

// ============================================================================
// Search
// ============================================================================

/// A session-scoped search query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query embedding
    pub embedding: Vec<f32>,
    /// Session tag; only entries with this chat id are candidates
    pub chat_id: Uuid,
    /// Maximum results to return
    pub limit: usize,
}

/// A search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entry id of the matching chunk
    pub chunk_id: String,
    /// Owning session tag
    pub chat_id: Uuid,
    /// Passage text
    pub content: String,
    /// Similarity score, higher is more similar
    pub score: f32,
    /// Position of the chunk within its source document
    pub chunk_index: u32,
    /// Source filename
    pub filename: String,
}

/// Vector store statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total number of stored chunks across all sessions
    pub total_chunks: u64,
    /// Number of distinct sessions with at least one chunk
    pub total_sessions: u64,
    /// Index size on disk in bytes (0 for in-memory stores)
    pub index_size_bytes: u64,
    /// Last update time
    pub last_updated: Option<DateTime<Utc>>,
}
