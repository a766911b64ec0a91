//! Configuration handling for docchat.
//!
//! Settings load from `~/.config/docchat/config.toml` when the file exists
//! and fall back to built-in defaults otherwise. The `GOOGLE_API_KEY`
//! environment variable always wins over the key in the file.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Provider credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing file at the default location yields the built-in defaults;
    /// a missing file at an explicitly given path is an error.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => match Self::config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Path of the config file, if a config directory can be determined.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Sample configuration file with every setting at its default.
    pub fn sample_toml() -> String {
        r#"# docchat configuration

[storage]
# Where the chat database and vector index live (default: XDG data dir)
# data_dir = "/path/to/data"

[api]
# Google API key; the GOOGLE_API_KEY environment variable takes precedence
# google_api_key = "..."

[embedding]
model = "models/embedding-001"
dimension = 768
batch_size = 32

[generation]
model = "models/gemini-2.5-flash"

[chunking]
target_size = 1000
overlap = 200

[query]
top_k = 3

[logging]
level = "info"
"#
        .to_string()
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Data directory override (default: XDG data dir)
    pub data_dir: Option<PathBuf>,
}

/// Provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Google API key used for both embedding and generation
    pub google_api_key: Option<String>,
}

/// Embedding-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension; must match the model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Texts sent to the provider per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_model() -> String {
    docchat_embed::DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> usize {
    docchat_embed::DEFAULT_EMBEDDING_DIM
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
        }
    }
}

/// Generation-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Generation model
    #[serde(default = "default_generation_model")]
    pub model: String,
}

fn default_generation_model() -> String {
    docchat_llm::DEFAULT_GENERATION_MODEL.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
        }
    }
}

/// Chunking-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size (characters)
    #[serde(default = "default_target_size")]
    pub target_size: usize,

    /// Overlap between consecutive chunks (characters)
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_target_size() -> usize {
    1000
}

fn default_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            overlap: default_overlap(),
        }
    }
}

/// Query-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Passages retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    docchat_engine::DEFAULT_TOP_K
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the XDG data directory for docchat.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCCHAT_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "docchat").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the XDG config directory for docchat.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCCHAT_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "docchat").map(|dirs| dirs.config_dir().to_path_buf())
}
