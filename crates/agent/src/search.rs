//! Web search client.
//!
//! One outbound query, an ordered list of candidate results back. Non-2xx
//! responses are fatal for the whole query; an empty result list is reported
//! by the orchestrator as `NoResults`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use techmate_core::{AppError, AppResult};

const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Search request timeout in seconds
const SEARCH_TIMEOUT_SECS: u64 = 20;

/// One web search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title
    pub title: String,

    /// Result URL; may be empty when the provider omits it
    pub link: String,

    /// Short text snippet shown on the results page
    pub snippet: String,
}

/// Trait for web search providers.
#[async_trait::async_trait]
pub trait SearchClient: Send + Sync {
    /// Get the provider name (e.g., "serpapi").
    fn provider_name(&self) -> &str;

    /// Run one search and return up to `count` ordered results.
    async fn search(&self, query: &str, count: usize) -> AppResult<Vec<SearchResult>>;
}

/// SerpApi response shape (the part we consume).
#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// SerpApi search client.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl SerpApiClient {
    /// Create a client against the hosted SerpApi endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    /// Create a client with a custom endpoint.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl SearchClient for SerpApiClient {
    fn provider_name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, count: usize) -> AppResult<Vec<SearchResult>> {
        tracing::info!(query, count, "Running web search");

        let num = count.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to reach search API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Search(format!(
                "Search API error ({}): {}",
                status, error_text
            )));
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;

        let results: Vec<SearchResult> = body
            .organic_results
            .into_iter()
            .map(|raw| SearchResult {
                title: raw.title.unwrap_or_default(),
                // Some providers report the URL under "url" instead of "link".
                link: raw.link.or(raw.url).unwrap_or_default(),
                snippet: raw.snippet.unwrap_or_default(),
            })
            .collect();

        tracing::info!(results = results.len(), "Web search completed");

        Ok(results)
    }
}
