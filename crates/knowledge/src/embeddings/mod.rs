//! Embedding generation for retrieval.
//!
//! Provides provider-agnostic embedding generation. Embedding failures are
//! fatal for the query they belong to: retrieval without embeddings would be
//! meaningless, so nothing here retries or degrades silently.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use serde::{Deserialize, Serialize};

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name ("ollama", "trigram")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Expected embedding dimensions
    pub dimensions: usize,

    /// Optional custom endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: None,
        }
    }
}
