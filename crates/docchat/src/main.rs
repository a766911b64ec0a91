//! # docchat CLI
//!
//! Command-line interface for docchat, a retrieval-augmented document chat.
//!
//! Attach documents to a chat and ask questions about them; answers are
//! grounded in passages retrieved from the attached documents only.
//!
//! ## Commands
//!
//! - `docchat new` - Start a new chat
//! - `docchat list` - List chats, most recently active first
//! - `docchat attach <CHAT_ID> <FILE>` - Attach a document to a chat
//! - `docchat ask <CHAT_ID> <QUESTION>` - Ask a question
//! - `docchat history <CHAT_ID>` - Show a chat's transcript
//! - `docchat rename <CHAT_ID> <TITLE>` - Rename a chat
//! - `docchat delete <CHAT_ID>` - Delete a chat and its documents
//! - `docchat purge [CHAT_ID] [--all]` - Drop indexed documents
//! - `docchat status [CHAT_ID]` - Show index statistics
//!
//! ## Examples
//!
//! ```bash
//! # Start a chat and attach a document
//! docchat new
//! docchat attach 3f8a... report.pdf
//!
//! # Ask about it
//! docchat ask 3f8a... "What were the quarterly results?"
//!
//! # Get JSON output
//! docchat ask 3f8a... "revenue?" --format json
//! ```
//!
//! Requires a `GOOGLE_API_KEY` (environment variable or config file) for
//! the embedding and generation calls.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docchat_chunker::RecursiveChunker;
use docchat_core::{Chat, ChunkConfig, EmbeddingConfig, Message, VectorStore};
use docchat_embed::GeminiEmbedder;
use docchat_engine::{ChatEngine, EngineConfig};
use docchat_extract::{DocxExtractor, ExtractorRegistry, PdfExtractor, TextExtractor};
use docchat_llm::GeminiGenerator;
use docchat_persist::ChatStore;
use docchat_store::LanceStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

mod config;

use config::{Config, data_dir};

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Chat with your documents from the terminal")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/docchat/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new chat
    New,

    /// List chats, most recently active first
    List,

    /// Show a chat's transcript
    History {
        /// Chat identifier
        chat_id: Uuid,
    },

    /// Rename a chat
    Rename {
        /// Chat identifier
        chat_id: Uuid,

        /// New title
        title: String,
    },

    /// Delete a chat, its transcript, and its indexed documents
    Delete {
        /// Chat identifier
        chat_id: Uuid,
    },

    /// Attach a document (txt, md, pdf, docx) to a chat
    Attach {
        /// Chat identifier
        chat_id: Uuid,

        /// Document to attach
        file: PathBuf,
    },

    /// Ask a question against a chat's attached documents
    Ask {
        /// Chat identifier
        chat_id: Uuid,

        /// Question text
        question: String,

        /// Passages to retrieve (default from config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Drop indexed documents; transcripts are kept
    Purge {
        /// Chat whose documents to drop
        chat_id: Option<Uuid>,

        /// Drop every chat's documents
        #[arg(long, conflicts_with = "chat_id")]
        all: bool,
    },

    /// Show index statistics, for the whole store or one chat
    Status {
        /// Chat to inspect
        chat_id: Option<Uuid>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for chats.
#[derive(Serialize)]
struct ChatItem {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

/// Output structure for transcript entries.
#[derive(Serialize)]
struct MessageItem {
    role: &'static str,
    content: String,
    created_at: String,
}

/// Output structure for one question/answer turn.
#[derive(Serialize)]
struct AskOutput {
    question: String,
    answer: String,
    sources: Vec<SourceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    renamed_to: Option<String>,
    retrieval_failed: bool,
    generation_failed: bool,
}

#[derive(Serialize)]
struct SourceItem {
    file: String,
    score: f32,
    content: String,
}

/// Output structure for attach.
#[derive(Serialize)]
struct AttachOutput {
    file: String,
    chunks: u32,
    skipped: bool,
}

/// Output structure for delete and purge.
#[derive(Serialize)]
struct RemovalOutput {
    chunks_removed: u64,
}

/// Output structure for status.
#[derive(Serialize)]
struct StatusOutput {
    total_chunks: u64,
    total_sessions: u64,
    index_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Output structure for per-chat status.
#[derive(Serialize)]
struct ChatStatusOutput {
    id: String,
    title: String,
    messages: u64,
    chunks: u64,
}

/// Resolve the directory holding the chat database and vector index.
fn storage_dir(config: &Config) -> Result<PathBuf> {
    if let Some(ref dir) = config.storage.data_dir {
        return Ok(dir.clone());
    }
    data_dir().context("Failed to determine data directory")
}

fn open_chats(config: &Config) -> Result<Arc<ChatStore>> {
    let path = storage_dir(config)?.join("chats.db");
    Ok(Arc::new(ChatStore::new(path)?))
}

fn open_vectors(config: &Config) -> Result<Arc<LanceStore>> {
    let path = storage_dir(config)?.join("index.lance");
    Ok(Arc::new(LanceStore::new(path, config.embedding.dimension)))
}

/// Resolve the Google API key from the environment or the config file.
fn resolve_api_key(config: &Config) -> Result<String> {
    if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    config.api.google_api_key.clone().context(
        "No API key found. Set GOOGLE_API_KEY or add google_api_key to the config file.",
    )
}

/// Create the full component stack for commands that embed or generate.
async fn build_engine(config: &Config) -> Result<ChatEngine> {
    let api_key = resolve_api_key(config)?;

    let chats = open_chats(config)?;
    let vectors = open_vectors(config)?;

    let mut extractors = ExtractorRegistry::new();
    extractors.register("text", TextExtractor::new());
    extractors.register("pdf", PdfExtractor::new());
    extractors.register("docx", DocxExtractor::new());

    let embedder = GeminiEmbedder::new(&api_key)?
        .with_model(&config.embedding.model, config.embedding.dimension);
    let generator = GeminiGenerator::new(&api_key)?.with_model(&config.generation.model);

    let engine_config = EngineConfig {
        chunk_config: ChunkConfig {
            target_size: config.chunking.target_size,
            overlap: config.chunking.overlap,
        },
        embed_config: EmbeddingConfig {
            batch_size: config.embedding.batch_size,
        },
        top_k: config.query.top_k,
    };

    let engine = ChatEngine::new(
        chats,
        vectors as Arc<dyn VectorStore>,
        Arc::new(extractors),
        Arc::new(RecursiveChunker::new()),
        Arc::new(embedder),
        Arc::new(generator),
        engine_config,
    );
    engine
        .init()
        .await
        .context("Failed to initialize vector store")?;
    Ok(engine)
}

fn chat_item(chat: &Chat) -> ChatItem {
    ChatItem {
        id: chat.id.to_string(),
        title: chat.title.clone(),
        created_at: chat.created_at.to_rfc3339(),
        updated_at: chat.updated_at.to_rfc3339(),
    }
}

fn message_item(message: &Message) -> MessageItem {
    MessageItem {
        role: message.role.as_str(),
        content: message.content.clone(),
        created_at: message.created_at.to_rfc3339(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.clone()).context("Failed to load config")?;

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::New => {
            let chats = open_chats(&config)?;
            let chat = chats.create_chat()?;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&chat_item(&chat))?);
                }
                OutputFormat::Text => {
                    println!("Created chat {}", chat.id);
                }
            }
        }

        Commands::List => {
            let chats = open_chats(&config)?;
            let all = chats.list_chats()?;

            match cli.format {
                OutputFormat::Json => {
                    let items: Vec<ChatItem> = all.iter().map(chat_item).collect();
                    println!("{}", serde_json::to_string_pretty(&items)?);
                }
                OutputFormat::Text => {
                    if all.is_empty() {
                        println!("No chats yet. Run 'docchat new' to start one.");
                    } else {
                        for chat in &all {
                            println!(
                                "{}  {}  (updated {})",
                                chat.id,
                                chat.title,
                                chat.updated_at.format("%Y-%m-%d %H:%M:%S")
                            );
                        }
                    }
                }
            }
        }

        Commands::History { chat_id } => {
            let chats = open_chats(&config)?;
            let chat = chats.get_chat(chat_id)?;
            let messages = chats.get_messages(chat_id)?;

            match cli.format {
                OutputFormat::Json => {
                    let items: Vec<MessageItem> = messages.iter().map(message_item).collect();
                    println!("{}", serde_json::to_string_pretty(&items)?);
                }
                OutputFormat::Text => {
                    println!("{} ({} messages)\n", chat.title, messages.len());
                    for message in &messages {
                        println!(
                            "[{}] {}: {}",
                            message.created_at.format("%Y-%m-%d %H:%M:%S"),
                            message.role.as_str(),
                            message.content
                        );
                    }
                }
            }
        }

        Commands::Rename { chat_id, title } => {
            let chats = open_chats(&config)?;
            chats.rename_chat(chat_id, &title)?;

            match cli.format {
                OutputFormat::Json => {
                    let chat = chats.get_chat(chat_id)?;
                    println!("{}", serde_json::to_string_pretty(&chat_item(&chat))?);
                }
                OutputFormat::Text => {
                    println!("Renamed chat {chat_id} to \"{title}\"");
                }
            }
        }

        Commands::Delete { chat_id } => {
            let chats = open_chats(&config)?;
            chats.get_chat(chat_id)?;

            let vectors = open_vectors(&config)?;
            vectors.init().await?;

            // Vectors first; chat rows are removed only once the purge
            // succeeded, so a failed delete stays retryable.
            let purged = vectors.purge_session(chat_id).await?;
            chats.delete_chat(chat_id)?;

            match cli.format {
                OutputFormat::Json => {
                    let output = RemovalOutput {
                        chunks_removed: purged,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!("Deleted chat {chat_id} ({purged} chunks removed)");
                }
            }
        }

        Commands::Attach { chat_id, file } => {
            if !file.exists() {
                anyhow::bail!("File does not exist: {}", file.display());
            }

            let engine = build_engine(&config).await?;
            let outcome = engine.attach(chat_id, &file).await?;

            match cli.format {
                OutputFormat::Json => {
                    let output = AttachOutput {
                        file: outcome.filename,
                        chunks: outcome.chunk_count,
                        skipped: outcome.skipped,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    if outcome.skipped {
                        println!("{} is already attached to this chat.", outcome.filename);
                    } else {
                        println!("Attached {} ({} chunks)", outcome.filename, outcome.chunk_count);
                    }
                }
            }
        }

        Commands::Ask {
            chat_id,
            question,
            top_k,
        } => {
            if let Some(k) = top_k {
                config.query.top_k = k;
            }

            let engine = build_engine(&config).await?;
            let outcome = engine.ask(chat_id, &question).await?;

            match cli.format {
                OutputFormat::Json => {
                    let output = AskOutput {
                        question: question.clone(),
                        answer: outcome.answer.clone(),
                        sources: outcome
                            .retrieved
                            .iter()
                            .map(|r| SourceItem {
                                file: r.filename.clone(),
                                score: r.score,
                                content: truncate(&r.content, 200),
                            })
                            .collect(),
                        renamed_to: outcome.renamed_to.clone(),
                        retrieval_failed: outcome.retrieval_failed,
                        generation_failed: outcome.generation_failed,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    if let Some(ref title) = outcome.renamed_to {
                        println!("(chat renamed to \"{title}\")\n");
                    }
                    println!("{}\n", outcome.answer);

                    if outcome.retrieval_failed {
                        println!("note: retrieval failed, answered without document context");
                    } else if !outcome.retrieved.is_empty() {
                        println!("Sources:");
                        for (i, result) in outcome.retrieved.iter().enumerate() {
                            println!("{}. {} (score: {:.3})", i + 1, result.filename, result.score);
                            println!("   {}", truncate(&result.content, 100));
                        }
                    }
                }
            }
        }

        Commands::Purge { chat_id, all } => {
            let vectors = open_vectors(&config)?;
            vectors.init().await?;

            let removed = match (chat_id, all) {
                (Some(id), _) => vectors.purge_session(id).await?,
                (None, true) => vectors.purge_all().await?,
                (None, false) => anyhow::bail!("Specify a chat id or --all"),
            };

            match cli.format {
                OutputFormat::Json => {
                    let output = RemovalOutput {
                        chunks_removed: removed,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!("Removed {removed} chunks");
                }
            }
        }

        Commands::Status { chat_id } => {
            let vectors = open_vectors(&config)?;
            vectors.init().await?;

            if let Some(id) = chat_id {
                let chats = open_chats(&config)?;
                let chat = chats.get_chat(id)?;
                let messages = chats.message_count(id)?;
                let chunks = vectors.count_session(id).await?;

                match cli.format {
                    OutputFormat::Json => {
                        let output = ChatStatusOutput {
                            id: chat.id.to_string(),
                            title: chat.title,
                            messages,
                            chunks,
                        };
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", chat.title);
                        println!("  Messages: {messages}");
                        println!("  Chunks:   {chunks}");
                    }
                }
            } else {
                let stats = vectors.stats().await?;

                match cli.format {
                    OutputFormat::Json => {
                        let output = StatusOutput {
                            total_chunks: stats.total_chunks,
                            total_sessions: stats.total_sessions,
                            index_size_bytes: stats.index_size_bytes,
                            last_updated: stats.last_updated.map(|t| t.to_rfc3339()),
                        };
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("Index status");
                        println!("  Chunks:   {}", stats.total_chunks);
                        println!("  Sessions: {}", stats.total_sessions);
                        println!("  Size:     {} bytes", stats.index_size_bytes);
                        if let Some(last) = stats.last_updated {
                            println!("  Updated:  {}", last.format("%Y-%m-%d %H:%M:%S"));
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

/// Truncate a string to max length, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let prefix: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{prefix}...")
    }
}
