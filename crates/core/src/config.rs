//! Configuration management for the TechMate assistant.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.techmate/config.yaml)
//!
//! The configuration is workspace-centric; runtime state (the query cache)
//! lives in `.techmate/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default number of web search results requested per query.
pub const DEFAULT_SEARCH_RESULTS: usize = 5;

/// Default number of chunks retrieved from the vector index.
pub const DEFAULT_TOP_K: usize = 5;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default per-page character budget after cleaning.
pub const DEFAULT_PAGE_CHAR_BUDGET: usize = 20_000;

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// pipeline behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .techmate/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider for plan synthesis (e.g., "gemini", "ollama")
    pub provider: String,

    /// Model identifier for plan synthesis
    pub model: String,

    /// Optional custom endpoint for the LLM provider
    pub llm_endpoint: Option<String>,

    /// Embedding provider (e.g., "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dimensions: usize,

    /// SerpApi credential for web search
    pub serpapi_api_key: Option<String>,

    /// Gemini credential for plan synthesis
    pub gemini_api_key: Option<String>,

    /// Optional custom search endpoint (testing, proxies)
    pub search_endpoint: Option<String>,

    /// Number of web search results requested per query
    pub search_results: usize,

    /// Number of chunks retrieved from the vector index
    pub top_k: usize,

    /// Chunk size in characters
    pub chunk_size: usize,

    /// Per-page character budget after cleaning
    pub page_char_budget: usize,

    /// Optional whole-pipeline deadline in seconds
    pub deadline_secs: Option<u64>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure (`.techmate/config.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    search: Option<SearchSection>,
    retrieval: Option<RetrievalSection>,
    logging: Option<LoggingSection>,
    workspace: Option<WorkspaceSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "embeddingProvider")]
    embedding_provider: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "embeddingDimensions")]
    embedding_dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchSection {
    endpoint: Option<String>,
    results: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(rename = "pageCharBudget")]
    page_char_budget: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            llm_endpoint: None,
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dimensions: 768,
            serpapi_api_key: None,
            gemini_api_key: None,
            search_endpoint: None,
            search_results: DEFAULT_SEARCH_RESULTS,
            top_k: DEFAULT_TOP_K,
            chunk_size: DEFAULT_CHUNK_SIZE,
            page_char_budget: DEFAULT_PAGE_CHAR_BUDGET,
            deadline_secs: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `TECHMATE_WORKSPACE`: Override workspace path
    /// - `TECHMATE_CONFIG`: Path to config file
    /// - `TECHMATE_PROVIDER`: LLM provider
    /// - `TECHMATE_MODEL`: Model identifier
    /// - `SERPAPI_API_KEY`: Web search credential
    /// - `GEMINI_API_KEY`: Plan synthesis credential
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("TECHMATE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("TECHMATE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".techmate/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("TECHMATE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("TECHMATE_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("SERPAPI_API_KEY") {
            if !key.trim().is_empty() {
                config.serpapi_api_key = Some(key);
            }
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                config.gemini_api_key = Some(key);
            }
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            result.llm_endpoint = llm.endpoint.or(result.llm_endpoint);
            if let Some(provider) = llm.embedding_provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = llm.embedding_model {
                result.embedding_model = model;
            }
            if let Some(dims) = llm.embedding_dimensions {
                result.embedding_dimensions = dims;
            }
        }

        if let Some(search) = config_file.search {
            result.search_endpoint = search.endpoint.or(result.search_endpoint);
            if let Some(results) = search.results {
                result.search_results = results;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(chunk_size) = retrieval.chunk_size {
                result.chunk_size = chunk_size;
            }
            if let Some(budget) = retrieval.page_char_budget {
                result.page_char_budget = budget;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .techmate state directory.
    pub fn techmate_dir(&self) -> PathBuf {
        self.workspace.join(".techmate")
    }

    /// Get the path to the persisted query cache.
    pub fn cache_path(&self) -> PathBuf {
        self.techmate_dir().join("cache.json")
    }

    /// Ensure the .techmate directory exists.
    pub fn ensure_techmate_dir(&self) -> AppResult<()> {
        let dir = self.techmate_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .techmate directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration for the active providers.
    ///
    /// Missing credentials are a startup failure, not a per-query one.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["gemini", "ollama"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.serpapi_api_key.is_none() {
            return Err(AppError::Config(
                "Missing SERPAPI_API_KEY in environment.".to_string(),
            ));
        }

        if self.provider == "gemini" && self.gemini_api_key.is_none() {
            return Err(AppError::Config(
                "Missing GEMINI_API_KEY in environment.".to_string(),
            ));
        }

        let known_embedders = ["ollama", "trigram"];
        if !known_embedders.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedders.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        AppConfig {
            serpapi_api_key: Some("serp-key".to_string()),
            gemini_api_key: Some("gem-key".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.search_results, 5);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.page_char_budget, 20_000);
        assert!(!config.verbose);
    }

    #[test]
    fn test_techmate_dir() {
        let config = AppConfig::default();
        assert!(config.techmate_dir().ends_with(".techmate"));
        assert!(config.cache_path().ends_with(".techmate/cache.json"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_missing_search_key() {
        let mut config = AppConfig::default();
        config.serpapi_api_key = None;
        config.gemini_api_key = Some("gem-key".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn test_validate_missing_gemini_key() {
        let mut config = configured();
        config.gemini_api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_validate_ollama_needs_no_llm_key() {
        let mut config = configured();
        config.provider = "ollama".to_string();
        config.gemini_api_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = configured();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "llm:\n  provider: ollama\n  model: llama3.2\nretrieval:\n  topK: 3\n  chunkSize: 500\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.top_k, 3);
        assert_eq!(merged.chunk_size, 500);
        // Untouched sections keep defaults
        assert_eq!(merged.search_results, 5);
    }
}
