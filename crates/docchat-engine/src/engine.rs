//! Chat engine orchestrating the document chat pipeline.
//!
//! One engine owns both sides of a session: the document side
//! (extract, chunk, embed, store) and the conversation side (retrieve,
//! compose, generate, persist). Sessions are isolated by `chat_id` at both
//! storage layers; deleting a chat purges its vectors before its rows so a
//! failed delete never leaves orphaned embeddings behind.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docchat_core::{
    Chat, ChunkConfig, ChunkOutput, Chunker, DocumentChunk, Embedder, EmbeddingConfig, Generator,
    Message, Result, Role, SearchQuery, SearchResult, StoreStats, VectorStore, DEFAULT_CHAT_TITLE,
};
use docchat_extract::ExtractorRegistry;
use docchat_llm::compose_prompt;
use docchat_persist::ChatStore;

/// Number of passages retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// Questions longer than this are shortened to this many characters plus an
/// ellipsis when they become a chat title.
const TITLE_MAX_CHARS: usize = 16;

/// Configuration for the chat engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chunk configuration
    pub chunk_config: ChunkConfig,
    /// Embedding configuration
    pub embed_config: EmbeddingConfig,
    /// Passages retrieved per question
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_config: ChunkConfig::default(),
            embed_config: EmbeddingConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Result of attaching a document to a chat.
#[derive(Debug, Clone)]
pub struct AttachOutcome {
    /// Name of the attached file
    pub filename: String,
    /// Chunks indexed for this document
    pub chunk_count: u32,
    /// True if the file was already attached and nothing was done
    pub skipped: bool,
}

/// Result of one question/answer turn.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    /// The answer shown to the user (an error string if generation failed)
    pub answer: String,
    /// Passages that grounded the answer, most similar first
    pub retrieved: Vec<SearchResult>,
    /// True if retrieval failed and the turn ran with an empty context
    pub retrieval_failed: bool,
    /// True if the provider call failed and `answer` is an error string
    pub generation_failed: bool,
    /// New title, when this question named a freshly created chat
    pub renamed_to: Option<String>,
}

/// Orchestrates document indexing, retrieval, generation, and persistence.
pub struct ChatEngine {
    chats: Arc<ChatStore>,
    vectors: Arc<dyn VectorStore>,
    extractors: Arc<ExtractorRegistry>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: EngineConfig,
    /// Filenames already attached per chat, to skip duplicate uploads
    attached: Arc<RwLock<HashMap<Uuid, HashSet<String>>>>,
}

impl ChatEngine {
    /// Create a new engine from its components.
    pub fn new(
        chats: Arc<ChatStore>,
        vectors: Arc<dyn VectorStore>,
        extractors: Arc<ExtractorRegistry>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            chats,
            vectors,
            extractors,
            chunker,
            embedder,
            generator,
            config,
            attached: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Initialize the vector store. Call once before any other operation.
    pub async fn init(&self) -> Result<()> {
        self.vectors.init().await?;
        Ok(())
    }

    // ====== Chats ======

    /// Create a new chat with the default title.
    pub fn create_chat(&self) -> Result<Chat> {
        Ok(self.chats.create_chat()?)
    }

    /// List all chats, most recently active first.
    pub fn list_chats(&self) -> Result<Vec<Chat>> {
        Ok(self.chats.list_chats()?)
    }

    /// Transcript of a chat in chronological order.
    pub fn history(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        Ok(self.chats.get_messages(chat_id)?)
    }

    /// Rename a chat.
    pub fn rename_chat(&self, chat_id: Uuid, title: &str) -> Result<()> {
        Ok(self.chats.rename_chat(chat_id, title)?)
    }

    /// Delete a chat, its messages, and its indexed documents. Returns the
    /// number of chunks purged from the vector store.
    pub async fn delete_chat(&self, chat_id: Uuid) -> Result<u64> {
        self.chats.get_chat(chat_id)?;

        // Vectors first. If the purge fails the chat rows stay and the
        // delete can be retried without leaking another session's context.
        let purged = self.vectors.purge_session(chat_id).await?;
        self.chats.delete_chat(chat_id)?;
        self.attached.write().await.remove(&chat_id);

        info!(chat_id = %chat_id, chunks = purged, "deleted chat");
        Ok(purged)
    }

    // ====== Documents ======

    /// Attach a document to a chat: extract, chunk, embed, and index it
    /// under the chat's session tag. A filename already attached to this
    /// chat is skipped.
    pub async fn attach(&self, chat_id: Uuid, path: &Path) -> Result<AttachOutcome> {
        self.chats.get_chat(chat_id)?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        {
            let attached = self.attached.read().await;
            if attached
                .get(&chat_id)
                .is_some_and(|files| files.contains(&filename))
            {
                info!(chat_id = %chat_id, filename = %filename, "already attached, skipping");
                return Ok(AttachOutcome {
                    filename,
                    chunk_count: 0,
                    skipped: true,
                });
            }
        }

        let content = self.extractors.extract(path).await?;
        let outputs = self.chunker.chunk(&content, &self.config.chunk_config).await?;

        let chunk_count = if outputs.is_empty() {
            debug!(chat_id = %chat_id, filename = %filename, "document has no content to index");
            0
        } else {
            let texts: Vec<&str> = outputs.iter().map(|o| o.content.as_str()).collect();
            let embeddings = self
                .embedder
                .embed_documents(&texts, &self.config.embed_config)
                .await?;

            let chunks = build_chunks(
                chat_id,
                &filename,
                outputs,
                embeddings,
                self.embedder.model_name(),
            );
            self.vectors.upsert_chunks(&chunks).await?;
            chunks.len() as u32
        };

        self.attached
            .write()
            .await
            .entry(chat_id)
            .or_default()
            .insert(filename.clone());

        self.chats.append_message(
            chat_id,
            Role::System,
            &format!("Processed {filename} ({chunk_count} chunks)"),
        )?;

        info!(chat_id = %chat_id, filename = %filename, chunks = chunk_count, "attached document");
        Ok(AttachOutcome {
            filename,
            chunk_count,
            skipped: false,
        })
    }

    /// Delete all indexed documents for a chat, keeping its transcript.
    /// Returns the number of chunks removed.
    pub async fn purge_session(&self, chat_id: Uuid) -> Result<u64> {
        let purged = self.vectors.purge_session(chat_id).await?;
        self.attached.write().await.remove(&chat_id);
        info!(chat_id = %chat_id, chunks = purged, "purged session documents");
        Ok(purged)
    }

    /// Delete all indexed documents across every chat. Returns the number of
    /// chunks removed.
    pub async fn purge_all(&self) -> Result<u64> {
        let purged = self.vectors.purge_all().await?;
        self.attached.write().await.clear();
        info!(chunks = purged, "purged all documents");
        Ok(purged)
    }

    /// Vector store statistics.
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.vectors.stats().await?)
    }

    // ====== Questions ======

    /// Run one question/answer turn against a chat.
    ///
    /// Retrieval and generation degrade rather than fail the turn: a
    /// retrieval error yields an empty context, a generation error yields an
    /// error string as the answer. Both the question and the answer are
    /// persisted to the transcript, in that order.
    pub async fn ask(&self, chat_id: Uuid, question: &str) -> Result<AskOutcome> {
        let chat = self.chats.get_chat(chat_id)?;

        // The first question names the chat while the default title is
        // still in place.
        let renamed_to = if chat.title == DEFAULT_CHAT_TITLE && !question.trim().is_empty() {
            let title = derive_title(question);
            self.chats.rename_chat(chat_id, &title)?;
            Some(title)
        } else {
            None
        };

        let (retrieved, retrieval_failed) = self.retrieve(chat_id, question).await;
        let prompt = compose_prompt(&retrieved, question);

        let (answer, generation_failed) = match self.generator.generate(&prompt).await {
            Ok(answer) => (answer, false),
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "generation failed");
                (format!("Error: {e}"), true)
            }
        };

        self.chats.append_message(chat_id, Role::User, question)?;
        self.chats.append_message(chat_id, Role::Assistant, &answer)?;

        Ok(AskOutcome {
            answer,
            retrieved,
            retrieval_failed,
            generation_failed,
            renamed_to,
        })
    }

    async fn retrieve(&self, chat_id: Uuid, question: &str) -> (Vec<SearchResult>, bool) {
        let embedding = match self
            .embedder
            .embed_query(question, &self.config.embed_config)
            .await
        {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "query embedding failed");
                return (Vec::new(), true);
            }
        };

        let query = SearchQuery {
            embedding,
            chat_id,
            limit: self.config.top_k,
        };
        match self.vectors.search(query).await {
            Ok(results) => {
                debug!(chat_id = %chat_id, hits = results.len(), "retrieved context");
                (results, false)
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "retrieval failed");
                (Vec::new(), true)
            }
        }
    }
}

/// Build session-tagged chunks from chunker output and embeddings.
fn build_chunks(
    chat_id: Uuid,
    filename: &str,
    outputs: Vec<ChunkOutput>,
    embeddings: Vec<Vec<f32>>,
    model_name: &str,
) -> Vec<DocumentChunk> {
    let now = Utc::now();
    outputs
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (output, embedding))| DocumentChunk {
            id: DocumentChunk::new_id(chat_id),
            chat_id,
            chunk_index: index as u32,
            filename: filename.to_string(),
            content: output.content,
            embedding: Some(embedding),
            embedding_model: Some(model_name.to_string()),
            indexed_at: Some(now),
        })
        .collect()
}

/// Shorten a question into a chat title.
fn derive_title(question: &str) -> String {
    let trimmed = question.trim();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        let prefix: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
        format!("{prefix}...")
    } else {
        trimmed.to_string()
    }
}
