//! Document chunking strategies for docchat.

pub mod recursive;

pub use recursive::RecursiveChunker;
