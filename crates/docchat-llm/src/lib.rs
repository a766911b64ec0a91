//! Answer generation layer for docchat.
//!
//! Implements the [`Generator`](docchat_core::Generator) trait against the
//! Gemini API and provides the prompt template that grounds the model in the
//! retrieved passages.
//!
//! # Components
//!
//! - [`GeminiGenerator`]: `generateContent` client (default model
//!   `models/gemini-2.5-flash`)
//! - [`compose_prompt`]: Builds the final prompt from retrieved passages and
//!   the user's question

pub mod gemini;
pub mod prompt;

pub use gemini::{GeminiGenerator, DEFAULT_GENERATION_MODEL};
pub use prompt::compose_prompt;
