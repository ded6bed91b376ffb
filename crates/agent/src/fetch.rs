//! Page fetching and HTML cleaning.
//!
//! Fetches a result URL, reduces the markup to normalized plain text, and
//! truncates to a character budget. A fetch failure is recovered by the
//! orchestrator (snippet fallback), never surfaced to the caller.

use scraper::Html;
use std::time::Duration;
use techmate_core::{AppError, AppResult};
use url::Url;

/// Identifying client tag sent with every page request.
pub const USER_AGENT: &str = "TechMateBot/1.0";

/// Page request timeout in seconds
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Elements whose text content is boilerplate or code, never prose.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Trait for page text sources.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return its cleaned, truncated plain text.
    async fn fetch_text(&self, url: &str) -> AppResult<String>;
}

/// HTTP page fetcher with HTML cleaning.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl PageFetcher {
    /// Create a fetcher with the given per-page character budget.
    ///
    /// Follows redirects and times out after 30 seconds per request.
    pub fn new(max_chars: usize) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, max_chars })
    }
}

#[async_trait::async_trait]
impl PageSource for PageFetcher {
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let parsed =
            Url::parse(url).map_err(|e| AppError::Fetch(format!("Invalid URL {}: {}", url, e)))?;

        tracing::debug!(url = %parsed, "Fetching page");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!(
                "Fetch of {} returned {}",
                url, status
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to read body of {}: {}", url, e)))?;

        Ok(truncate_chars(&clean_html(&html), self.max_chars))
    }
}

/// Reduce raw HTML to normalized plain text.
///
/// Drops script/style/noscript content, keeps the document's text nodes in
/// order, collapses runs of spaces and blank lines.
pub fn clean_html(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for node in document.tree.nodes() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });

        if !skipped {
            text.push_str(&fragment.text);
            text.push('\n');
        }
    }

    normalize_whitespace(&text)
}

/// Collapse intra-line whitespace runs and blank-line runs.
fn normalize_whitespace(input: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut prev_blank = false;

    for raw in input.lines() {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !prev_blank && !lines.is_empty() {
                lines.push(String::new());
            }
            prev_blank = true;
        } else {
            lines.push(collapsed);
            prev_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
