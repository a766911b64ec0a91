//! LanceDB-backed vector store.
//!
//! All chunks live in a single `chunks` table. Every row carries the owning
//! `chat_id`, and every search pushes a `chat_id` equality filter down into
//! LanceDB, so one chat session can never retrieve another session's
//! documents.

use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use docchat_core::error::StoreError;
use docchat_core::traits::VectorStore;
use docchat_core::types::{DocumentChunk, SearchQuery, SearchResult, StoreStats};

const CHUNKS_TABLE: &str = "chunks";

/// LanceDB-backed vector store.
pub struct LanceStore {
    db_path: PathBuf,
    embedding_dim: usize,
    connection: Arc<RwLock<Option<Connection>>>,
    chunks_table: Arc<RwLock<Option<Table>>>,
}

impl LanceStore {
    /// Create a new store rooted at the given directory.
    ///
    /// The connection is opened lazily on first use; call
    /// [`VectorStore::init`] before any other operation so the chunks table
    /// exists.
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, embedding_dim: usize) -> Self {
        Self {
            db_path: db_path.into(),
            embedding_dim,
            connection: Arc::new(RwLock::new(None)),
            chunks_table: Arc::new(RwLock::new(None)),
        }
    }

    /// Directory holding the LanceDB dataset.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Dimension every stored embedding must have.
    #[must_use]
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    async fn get_connection(&self) -> Result<Connection, StoreError> {
        {
            let guard = self.connection.read().await;
            if let Some(conn) = guard.as_ref() {
                return Ok(conn.clone());
            }
        }

        let mut guard = self.connection.write().await;
        // Another task may have connected while we waited for the write lock.
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let path = self.db_path.to_string_lossy().to_string();
        let conn = connect(&path)
            .execute()
            .await
            .map_err(|e| StoreError::Init(format!("failed to connect to {path}: {e}")))?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn get_chunks_table(&self) -> Result<Table, StoreError> {
        {
            let guard = self.chunks_table.read().await;
            if let Some(table) = guard.as_ref() {
                return Ok(table.clone());
            }
        }

        let conn = self.get_connection().await?;
        let mut guard = self.chunks_table.write().await;
        if let Some(table) = guard.as_ref() {
            return Ok(table.clone());
        }

        let table = conn
            .open_table(CHUNKS_TABLE)
            .execute()
            .await
            .map_err(|e| StoreError::Init(format!("failed to open chunks table: {e}")))?;
        *guard = Some(table.clone());
        Ok(table)
    }

    fn chunks_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("chat_id", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("filename", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.embedding_dim as i32,
                ),
                true,
            ),
            Field::new("embedding_model", DataType::Utf8, true),
            Field::new("indexed_at", DataType::Utf8, false),
        ]))
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn init(&self) -> Result<(), StoreError> {
        let conn = self.get_connection().await?;
        let existing = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| StoreError::Init(format!("failed to list tables: {e}")))?;

        if !existing.contains(&CHUNKS_TABLE.to_string()) {
            conn.create_empty_table(CHUNKS_TABLE, self.chunks_schema())
                .execute()
                .await
                .map_err(|e| StoreError::Init(format!("failed to create chunks table: {e}")))?;
            info!(
                path = %self.db_path.display(),
                dim = self.embedding_dim,
                "created chunks table"
            );
        }

        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), StoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let table = self.get_chunks_table().await?;
        let schema = self.chunks_schema();
        let batch = chunks_to_batch(chunks, schema.clone(), self.embedding_dim)?;

        // Drop rows sharing an id first so re-indexing cannot duplicate chunks.
        let id_list: Vec<String> = chunks
            .iter()
            .map(|c| format!("'{}'", c.id.replace('\'', "''")))
            .collect();
        table
            .delete(&format!("id IN ({})", id_list.join(", ")))
            .await
            .map_err(|e| StoreError::Delete(format!("failed to clear existing chunks: {e}")))?;

        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table
            .add(Box::new(batches))
            .execute()
            .await
            .map_err(|e| StoreError::Insert(format!("failed to insert chunks: {e}")))?;

        debug!(count = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        let table = self.get_chunks_table().await?;
        let filter = format!("chat_id = '{}'", query.chat_id);

        let mut stream = table
            .vector_search(query.embedding)
            .map_err(|e| StoreError::Query(format!("failed to build vector query: {e}")))?
            .distance_type(DistanceType::Cosine)
            .only_if(filter)
            .limit(query.limit)
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("search failed: {e}")))?;

        let mut results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| StoreError::Query(format!("failed to read search results: {e}")))?
        {
            results.extend(batch_to_search_results(&batch)?);
        }

        debug!(chat_id = %query.chat_id, hits = results.len(), "vector search complete");
        Ok(results)
    }

    async fn purge_session(&self, chat_id: Uuid) -> Result<u64, StoreError> {
        let table = self.get_chunks_table().await?;
        let filter = format!("chat_id = '{chat_id}'");

        let count = count_rows(&table, &filter).await?;
        if count > 0 {
            table.delete(&filter).await.map_err(|e| {
                StoreError::Delete(format!("failed to purge session {chat_id}: {e}"))
            })?;
            info!(chat_id = %chat_id, chunks = count, "purged session");
        }

        Ok(count)
    }

    async fn purge_all(&self) -> Result<u64, StoreError> {
        let table = self.get_chunks_table().await?;
        // Match-all filter.
        let filter = "chat_id LIKE '%'";

        let count = count_rows(&table, filter).await?;
        if count > 0 {
            table
                .delete(filter)
                .await
                .map_err(|e| StoreError::Delete(format!("failed to purge store: {e}")))?;
            info!(chunks = count, "purged all sessions");
        }

        Ok(count)
    }

    async fn count_session(&self, chat_id: Uuid) -> Result<u64, StoreError> {
        let table = self.get_chunks_table().await?;
        count_rows(&table, &format!("chat_id = '{chat_id}'")).await
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let table = self.get_chunks_table().await?;

        let mut stream = table
            .query()
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("stats query failed: {e}")))?;

        let mut total_chunks = 0u64;
        let mut sessions: HashSet<String> = HashSet::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| StoreError::Query(format!("failed to read stats results: {e}")))?
        {
            total_chunks += batch.num_rows() as u64;
            if let Some(col) = batch
                .column_by_name("chat_id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            {
                for i in 0..col.len() {
                    sessions.insert(col.value(i).to_string());
                }
            }
        }

        Ok(StoreStats {
            total_chunks,
            total_sessions: sessions.len() as u64,
            index_size_bytes: calculate_dir_size(&self.db_path).unwrap_or(0),
            last_updated: Some(Utc::now()),
        })
    }
}

// ============================================================================
// Conversion Helpers
// ============================================================================

fn chunks_to_batch(
    chunks: &[DocumentChunk],
    schema: Arc<Schema>,
    embedding_dim: usize,
) -> Result<RecordBatch, StoreError> {
    let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
    let chat_ids: Vec<String> = chunks.iter().map(|c| c.chat_id.to_string()).collect();
    let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
    let filenames: Vec<String> = chunks.iter().map(|c| c.filename.clone()).collect();
    let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let models: Vec<Option<String>> = chunks.iter().map(|c| c.embedding_model.clone()).collect();
    let indexed: Vec<String> = chunks
        .iter()
        .map(|c| c.indexed_at.unwrap_or_else(Utc::now).to_rfc3339())
        .collect();

    let vector_array = build_vector_array(chunks, embedding_dim)?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(chat_ids)),
            Arc::new(UInt32Array::from(indices)),
            Arc::new(StringArray::from(filenames)),
            Arc::new(StringArray::from(contents)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(models)),
            Arc::new(StringArray::from(indexed)),
        ],
    )
    .map_err(|e| StoreError::Schema(format!("failed to build record batch: {e}")))
}

fn build_vector_array(
    chunks: &[DocumentChunk],
    embedding_dim: usize,
) -> Result<FixedSizeListArray, StoreError> {
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let values = chunk
            .embedding
            .as_ref()
            .ok_or_else(|| StoreError::Schema(format!("chunk {} has no embedding", chunk.id)))?;
        if values.len() != embedding_dim {
            return Err(StoreError::Schema(format!(
                "chunk {} has a {}-dimensional embedding, expected {}",
                chunk.id,
                values.len(),
                embedding_dim
            )));
        }
        vectors.push(Some(values.iter().copied().map(Some).collect()));
    }

    Ok(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        vectors,
        embedding_dim as i32,
    ))
}

fn batch_to_search_results(batch: &RecordBatch) -> Result<Vec<SearchResult>, StoreError> {
    let ids = batch
        .column_by_name("id")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Schema("missing id column".to_string()))?;
    let chat_ids = batch
        .column_by_name("chat_id")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Schema("missing chat_id column".to_string()))?;
    let indices = batch
        .column_by_name("chunk_index")
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| StoreError::Schema("missing chunk_index column".to_string()))?;
    let filenames = batch
        .column_by_name("filename")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Schema("missing filename column".to_string()))?;
    let contents = batch
        .column_by_name("content")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Schema("missing content column".to_string()))?;
    // Present on vector search results, absent on plain scans.
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let mut results = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let chat_id = Uuid::parse_str(chat_ids.value(i))
            .map_err(|e| StoreError::Schema(format!("invalid chat_id value: {e}")))?;
        let score = distances.map(|d| 1.0 - d.value(i)).unwrap_or(0.0);

        results.push(SearchResult {
            chunk_id: ids.value(i).to_string(),
            chat_id,
            content: contents.value(i).to_string(),
            score,
            chunk_index: indices.value(i),
            filename: filenames.value(i).to_string(),
        });
    }

    Ok(results)
}

async fn count_rows(table: &Table, filter: &str) -> Result<u64, StoreError> {
    let mut stream = table
        .query()
        .only_if(filter)
        .execute()
        .await
        .map_err(|e| StoreError::Query(format!("count query failed: {e}")))?;

    let mut total = 0u64;
    while let Some(batch) = stream
        .try_next()
        .await
        .map_err(|e| StoreError::Query(format!("failed to read count results: {e}")))?
    {
        total += batch.num_rows() as u64;
    }
    Ok(total)
}

fn calculate_dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                size += calculate_dir_size(&entry.path())?;
            } else {
                size += metadata.len();
            }
        }
    }
    Ok(size)
}
