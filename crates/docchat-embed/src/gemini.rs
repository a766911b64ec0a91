//! Gemini embedding client.
//!
//! Talks to the Generative Language API over HTTP. Documents are embedded in
//! batches via `batchEmbedContents` with the `RETRIEVAL_DOCUMENT` task type;
//! queries use `embedContent` with `RETRIEVAL_QUERY`.

use async_trait::async_trait;
use docchat_core::{EmbedError, Embedder, EmbeddingConfig};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Dimension of the default embedding model.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

const TASK_RETRIEVAL_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_RETRIEVAL_QUERY: &str = "RETRIEVAL_QUERY";

/// Embedder backed by the Gemini embedding API (HTTP direct, no SDK).
pub struct GeminiEmbedder {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl GeminiEmbedder {
    /// Create a new client with an API key, using the default model.
    pub fn new(api_key: &str) -> Result<Self, EmbedError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| EmbedError::Request(format!("invalid API key format: {e}")))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| EmbedError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimension: DEFAULT_EMBEDDING_DIM,
        })
    }

    /// Override the API base URL (used by tests against a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a different embedding model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.model = model.into();
        self.dimension = dimension;
        self
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), EmbedError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(EmbedError::Response(format!(
                "expected {}-dimensional embedding, got {}",
                self.dimension,
                vector.len()
            )))
        }
    }

    async fn embed_batch(&self, texts: &[&str], task_type: &str) -> Result<Vec<Vec<f32>>, EmbedError> {
        let payload = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: ContentPayload {
                        parts: vec![TextPart { text }],
                    },
                    task_type,
                })
                .collect(),
        };

        let url = format!("{}/{}:batchEmbedContents", self.base_url, self.model);
        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api { status, message });
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Response(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbedError::Response(format!(
                "requested {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = parsed.embeddings.into_iter().map(|e| e.values).collect();
        for vector in &vectors {
            self.check_dimension(vector)?;
        }

        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_documents(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = config.batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            debug!("Embedding batch of {} documents", batch.len());
            let batch_vectors = self.embed_batch(batch, TASK_RETRIEVAL_DOCUMENT).await?;
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }

    async fn embed_query(
        &self,
        query: &str,
        _config: &EmbeddingConfig,
    ) -> Result<Vec<f32>, EmbedError> {
        let payload = EmbedRequest {
            model: &self.model,
            content: ContentPayload {
                parts: vec![TextPart { text: query }],
            },
            task_type: TASK_RETRIEVAL_QUERY,
        };

        let url = format!("{}/{}:embedContent", self.base_url, self.model);
        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api { status, message });
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Response(e.to_string()))?;

        self.check_dimension(&parsed.embedding.values)?;
        Ok(parsed.embedding.values)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: ContentPayload<'a>,
    #[serde(rename = "taskType")]
    task_type: &'a str,
}

#[derive(Serialize)]
struct ContentPayload<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
