//! Retrieval building blocks for the TechMate assistant.
//!
//! Everything needed to turn scraped page text into top-k relevant snippets
//! for one query, plus the persisted exact-match query cache:
//! - character chunking
//! - embedding providers
//! - the ephemeral per-query vector index
//! - the on-disk query cache

pub mod cache;
pub mod chunker;
pub mod embeddings;
pub mod index;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheStore, QueryCache};
pub use chunker::chunks;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::QueryIndex;
