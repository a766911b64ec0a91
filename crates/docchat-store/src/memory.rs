//! In-memory vector store.
//!
//! Brute-force cosine similarity over a `HashMap`. Nothing is persisted, so
//! this is only suitable for tests and throwaway sessions.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use docchat_core::error::StoreError;
use docchat_core::traits::VectorStore;
use docchat_core::types::{DocumentChunk, SearchQuery, SearchResult, StoreStats};

/// In-memory vector store keyed by chunk id.
pub struct MemoryStore {
    chunks: Arc<RwLock<HashMap<String, DocumentChunk>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_chunks(&self, new_chunks: &[DocumentChunk]) -> Result<(), StoreError> {
        for chunk in new_chunks {
            if chunk.embedding.is_none() {
                return Err(StoreError::Schema(format!(
                    "chunk {} has no embedding",
                    chunk.id
                )));
            }
        }

        let mut chunks = self.chunks.write().await;
        for chunk in new_chunks {
            chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        let chunks = self.chunks.read().await;

        let mut results: Vec<SearchResult> = chunks
            .values()
            .filter(|c| c.chat_id == query.chat_id)
            .filter_map(|c| {
                let embedding = c.embedding.as_ref()?;
                Some(SearchResult {
                    chunk_id: c.id.clone(),
                    chat_id: c.chat_id,
                    content: c.content.clone(),
                    score: Self::cosine_similarity(embedding, &query.embedding),
                    chunk_index: c.chunk_index,
                    filename: c.filename.clone(),
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(query.limit);
        Ok(results)
    }

    async fn purge_session(&self, chat_id: Uuid) -> Result<u64, StoreError> {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|_, c| c.chat_id != chat_id);
        Ok((before - chunks.len()) as u64)
    }

    async fn purge_all(&self) -> Result<u64, StoreError> {
        let mut chunks = self.chunks.write().await;
        let count = chunks.len() as u64;
        chunks.clear();
        Ok(count)
    }

    async fn count_session(&self, chat_id: Uuid) -> Result<u64, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(chunks.values().filter(|c| c.chat_id == chat_id).count() as u64)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let chunks = self.chunks.read().await;
        let sessions: HashSet<Uuid> = chunks.values().map(|c| c.chat_id).collect();

        Ok(StoreStats {
            total_chunks: chunks.len() as u64,
            total_sessions: sessions.len() as u64,
            index_size_bytes: 0,
            last_updated: Some(Utc::now()),
        })
    }
}
