//! Error types for the TechMate assistant.
//!
//! This module defines a unified error enum that covers all failure
//! categories in the pipeline: configuration, web search, page fetching,
//! embedding, plan synthesis, and the query cache.

use thiserror::Error;

/// Unified error type for the TechMate assistant.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Propagation policy: `Fetch` errors are absorbed by the orchestrator
/// (per-URL snippet fallback); every other variant propagates unmodified
/// to the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (missing credentials, bad config file).
    /// Fatal at startup, not per-query.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Web search failed (transport error or non-2xx response)
    #[error("Web search error: {0}")]
    Search(String),

    /// Web search succeeded but returned zero candidates
    #[error("No search results for query: {0}")]
    NoResults(String),

    /// A single page fetch failed; recovered locally via snippet fallback
    #[error("Page fetch error: {0}")]
    Fetch(String),

    /// Embedding call failed; fatal for the query
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Generated plan could not be parsed or failed validation
    #[error("Plan validation error: {0}")]
    SchemaValidation(String),

    /// Persisted query cache is unreadable. Fatal; never silently reset.
    #[error("Query cache corrupt: {0}")]
    CacheCorrupt(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Whole-pipeline deadline budget exceeded
    #[error("Deadline exceeded after {0:?}")]
    Timeout(std::time::Duration),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
