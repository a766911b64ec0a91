//! Vector storage layer for docchat using LanceDB.
//!
//! This crate provides the storage backend for the document chat pipeline,
//! implementing the [`VectorStore`](docchat_core::VectorStore) trait.
//!
//! # Backends
//!
//! - [`LanceStore`]: Embedded LanceDB dataset on disk, with the session
//!   filter pushed down into the vector search
//! - [`MemoryStore`]: Brute-force in-memory search for tests and short-lived
//!   sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_store::LanceStore;
//! use docchat_core::VectorStore;
//!
//! let store = LanceStore::new("path/to/vectors", 768);
//! store.init().await?;
//!
//! store.upsert_chunks(&chunks).await?;
//! let results = store.search(query).await?;
//! ```

pub mod lance;
pub mod memory;

pub use lance::LanceStore;
pub use memory::MemoryStore;
