//! Relational persistence layer for docchat chats.
//!
//! This crate owns the conversational side of the system: chat sessions and
//! their message transcripts, stored in SQLite via [`ChatStore`]. Document
//! chunks and embeddings live in `docchat-store`; the two are linked only by
//! `chat_id`.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_persist::ChatStore;
//! use docchat_core::Role;
//!
//! let store = ChatStore::new("path/to/chats.db")?;
//! let chat = store.create_chat()?;
//! store.append_message(chat.id, Role::User, "How does login work?")?;
//! ```

pub mod sqlite;

pub use sqlite::ChatStore;
