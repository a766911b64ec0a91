//! # docchat-engine
//!
//! Orchestration layer tying the docchat components into one application
//! engine.
//!
//! [`ChatEngine`] owns a conversation store, a vector store, and the
//! extraction/chunking/embedding/generation components, and exposes the
//! operations the interface layer calls:
//!
//! - Chat lifecycle: create, list, rename, delete, history
//! - Documents: attach (extract -> chunk -> embed -> index), purge
//! - Questions: one retrieval-augmented turn per [`ChatEngine::ask`] call
//!
//! Every indexed chunk is tagged with its chat's session id and every
//! retrieval filters on that tag, so documents attached to one chat are
//! never visible to another.

pub mod engine;

pub use engine::{AskOutcome, AttachOutcome, ChatEngine, EngineConfig, DEFAULT_TOP_K};
