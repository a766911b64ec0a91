//! Deterministic hashing embedder.
//!
//! This module provides a [`HashingEmbedder`] that derives embeddings from
//! token hashes instead of a hosted model. It's useful for:
//! - Testing without network access or an API key
//! - Offline development builds
//! - Reproducible retrieval behavior in integration tests
//!
//! Each whitespace-separated token is hashed with blake3 and expanded into a
//! pseudo-random vector; the text embedding is the normalized sum of its
//! token vectors. Texts sharing tokens therefore land close in cosine space,
//! which is enough to exercise ranked retrieval end to end.

use async_trait::async_trait;
use docchat_core::{EmbedError, Embedder, EmbeddingConfig};

/// Embedder that hashes tokens into a fixed-dimension vector space.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the default dimension (384).
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    /// Create a new hashing embedder with a custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut sum = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let vector = token_vector(self.dimension, token);
            for (s, v) in sum.iter_mut().zip(vector.iter()) {
                *s += v;
            }
        }

        normalize(&mut sum);
        sum
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_documents(
        &self,
        texts: &[&str],
        _config: &EmbeddingConfig,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
}

/// Expand a token hash into a pseudo-random vector with zero mean per axis.
fn token_vector(dimension: usize, token: &str) -> Vec<f32> {
    let lowered = token.to_lowercase();
    let mut hasher = blake3::Hasher::new();
    hasher.update(lowered.as_bytes());

    let mut bytes = vec![0u8; dimension];
    hasher.finalize_xof().fill(&mut bytes);

    bytes
        .iter()
        .map(|&b| (f32::from(b) / 255.0) - 0.5)
        .collect()
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }

    #[test]
    fn test_new_default_dimension() {
        let embedder = HashingEmbedder::new();
        assert_eq!(embedder.dimension(), 384);
        assert_eq!(embedder.model_name(), "hashing");
    }

    #[test]
    fn test_with_dimension() {
        let embedder = HashingEmbedder::with_dimension(64);
        assert_eq!(embedder.dimension(), 64);
    }

    #[tokio::test]
    async fn test_embeddings_are_deterministic() {
        let embedder = HashingEmbedder::with_dimension(64);
        let config = EmbeddingConfig::default();

        let first = embedder.embed_documents(&["hello world"], &config).await.unwrap();
        let second = embedder.embed_documents(&["hello world"], &config).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_embedding_dimension() {
        let embedder = HashingEmbedder::with_dimension(128);
        let config = EmbeddingConfig::default();

        let vectors = embedder
            .embed_documents(&["one", "two", "three"], &config)
            .await
            .unwrap();

        assert_eq!(vectors.len(), 3);
        for vector in &vectors {
            assert_eq!(vector.len(), 128);
        }
    }

    #[tokio::test]
    async fn test_embeddings_are_normalized() {
        let embedder = HashingEmbedder::with_dimension(64);
        let config = EmbeddingConfig::default();

        let vectors = embedder
            .embed_documents(&["the quick brown fox"], &config)
            .await
            .unwrap();

        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::with_dimension(64);
        let config = EmbeddingConfig::default();

        let vectors = embedder.embed_documents(&[""], &config).await.unwrap();
        assert!(vectors[0].iter().all(|&v| v == 0.0));
    }

    #[tokio::test]
    async fn test_shared_tokens_rank_higher() {
        let embedder = HashingEmbedder::with_dimension(384);
        let config = EmbeddingConfig::default();

        let docs = [
            "neural networks are a subset of machine learning",
            "postgresql and mysql are popular database systems",
        ];
        let vectors = embedder.embed_documents(&docs, &config).await.unwrap();
        let query = embedder
            .embed_query("machine learning neural networks", &config)
            .await
            .unwrap();

        let sim_ml = cosine(&query, &vectors[0]);
        let sim_db = cosine(&query, &vectors[1]);
        assert!(
            sim_ml > sim_db,
            "expected ML doc to rank higher ({sim_ml} vs {sim_db})"
        );
    }

    #[tokio::test]
    async fn test_tokenization_ignores_case_and_punctuation() {
        let embedder = HashingEmbedder::with_dimension(64);
        let config = EmbeddingConfig::default();

        let vectors = embedder
            .embed_documents(&["Hello, World!", "hello world"], &config)
            .await
            .unwrap();

        let sim = cosine(&vectors[0], &vectors[1]);
        assert!((sim - 1.0).abs() < 1e-5);
    }
}
