//! Error types for docchat.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for docchat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding provider failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Generation provider failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerateError),

    /// Conversation store failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Content extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("chunking failed: {0}")]
    Failed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding provider errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Response(String),
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("schema error: {0}")]
    Schema(String),
}

/// Generation provider errors.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Response(String),
}

/// Conversation store errors.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("database initialization failed: {0}")]
    Init(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("chat not found: {0}")]
    ChatNotFound(Uuid),
}

/// Result type alias for docchat operations.
pub type Result<T> = std::result::Result<T, Error>;
