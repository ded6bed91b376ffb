//! TechMate query orchestration.
//!
//! One call to [`Agent::submit`] runs a query's whole lifecycle:
//!
//! cache lookup → (hit: return) | (miss: search → fetch all pages →
//! build index → retrieve → synthesize → cache insert → return)
//!
//! The chunk corpus and vector index are values owned by the call; nothing
//! survives across queries except the injected query cache. Per-URL fetch
//! failures degrade to the result's search snippet; every other failure
//! aborts the query and propagates to the caller unmodified.

pub mod context;
pub mod fetch;
pub mod search;
pub mod synth;

pub use context::{RetrievedSnippet, TicketContext, DEFAULT_CONSTRAINT, SNIPPET_SOURCE};
pub use fetch::{PageFetcher, PageSource};
pub use search::{SearchClient, SearchResult, SerpApiClient};
pub use synth::PlanSynthesizer;

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use techmate_core::{AppError, AppResult};
use techmate_knowledge::chunker::chunks;
use techmate_knowledge::{CacheStore, EmbeddingProvider, QueryCache, QueryIndex};
use techmate_llm::TroubleshootingPlan;

/// Tunables for one agent instance.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Number of web search results requested (and pages fetched)
    pub search_results: usize,

    /// Number of chunks retrieved from the index
    pub top_k: usize,

    /// Chunk size in characters
    pub chunk_size: usize,

    /// Optional budget for the whole cache-miss pipeline. On expiry all
    /// in-flight calls are cancelled and the query fails with `Timeout`.
    pub deadline: Option<Duration>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            search_results: 5,
            top_k: 5,
            chunk_size: 1000,
            deadline: None,
        }
    }
}

/// The troubleshooting agent.
///
/// All collaborators are injected; the agent owns no ambient state beyond
/// them and may serve sequential queries forever. Concurrent queries must
/// use separate `submit` calls (the per-query index is call-scoped, so that
/// is safe) but may race on cache inserts, producing at worst a harmless
/// duplicate entry.
pub struct Agent {
    search: Arc<dyn SearchClient>,
    pages: Arc<dyn PageSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: PlanSynthesizer,
    cache: QueryCache,
    options: AgentOptions,
}

impl Agent {
    /// Create an agent from its collaborators.
    pub fn new(
        search: Arc<dyn SearchClient>,
        pages: Arc<dyn PageSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        synthesizer: PlanSynthesizer,
        cache: QueryCache,
        options: AgentOptions,
    ) -> Self {
        Self {
            search,
            pages,
            embedder,
            synthesizer,
            cache,
            options,
        }
    }

    /// Produce a troubleshooting plan for the given context.
    ///
    /// The cache key is the query text alone (case-insensitive); device and
    /// symptom context do not participate. Cached answers never expire.
    pub async fn submit(&self, ctx: &TicketContext) -> AppResult<TroubleshootingPlan> {
        tracing::info!(query = %ctx.query, "Submitting troubleshooting query");

        let mut store = self.cache.load()?;
        if let Some(plan) = store.lookup(&ctx.query) {
            tracing::info!(query = %ctx.query, "Query cache hit; skipping pipeline");
            return Ok(plan.clone());
        }

        match self.options.deadline {
            Some(budget) => tokio::time::timeout(budget, self.run_pipeline(ctx, &mut store))
                .await
                .map_err(|_| AppError::Timeout(budget))?,
            None => self.run_pipeline(ctx, &mut store).await,
        }
    }

    /// The cache-miss path: search → fetch → index → retrieve → synthesize
    /// → cache insert.
    async fn run_pipeline(
        &self,
        ctx: &TicketContext,
        store: &mut CacheStore,
    ) -> AppResult<TroubleshootingPlan> {
        // SEARCH
        let results = self
            .search
            .search(&ctx.query, self.options.search_results)
            .await?;
        if results.is_empty() {
            return Err(AppError::NoResults(ctx.query.clone()));
        }

        // FETCH_ALL: concurrent, order-preserving. A failed fetch degrades
        // to that result's search snippet; results without a URL are skipped.
        let candidates: Vec<_> = results
            .into_iter()
            .take(self.options.search_results)
            .filter(|r| !r.link.is_empty())
            .collect();

        let fetches = candidates.into_iter().map(|result| async move {
            match self.pages.fetch_text(&result.link).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        url = %result.link,
                        error = %e,
                        "Page fetch failed; falling back to search snippet"
                    );
                    result.snippet
                }
            }
        });
        let page_texts = join_all(fetches).await;

        // INDEX_BUILD: one corpus across all pages, fresh index per query.
        let mut corpus: Vec<String> = Vec::new();
        for text in &page_texts {
            corpus.extend(chunks(text, self.options.chunk_size).map(str::to_string));
        }
        tracing::info!(
            pages = page_texts.len(),
            chunks = corpus.len(),
            "Building query index"
        );

        let index = QueryIndex::build(Arc::clone(&self.embedder), corpus).await?;

        // RETRIEVE
        let retrieved = index.query(&ctx.query, self.options.top_k).await?;
        let snippets: Vec<RetrievedSnippet> = retrieved
            .into_iter()
            .map(RetrievedSnippet::from_chunk)
            .collect();

        // SYNTHESIZE
        let plan = self.synthesizer.synthesize(ctx, &snippets).await?;

        // CACHE_INSERT: unconditional; the context is not part of the key.
        self.cache.insert(store, &ctx.query, &plan)?;

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use techmate_knowledge::embeddings::providers::TrigramProvider;
    use techmate_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};

    struct StubSearch {
        results: Vec<SearchResult>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SearchClient for StubSearch {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn search(&self, _query: &str, _count: usize) -> AppResult<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    struct StubPages {
        /// Text returned for every successful fetch
        page_text: String,
        /// URLs that fail to load
        failing: HashSet<String>,
        /// Artificial latency per fetch
        delay: Option<Duration>,
    }

    #[async_trait::async_trait]
    impl PageSource for StubPages {
        async fn fetch_text(&self, url: &str) -> AppResult<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.contains(url) {
                return Err(AppError::Fetch(format!("boom: {}", url)));
            }
            Ok(self.page_text.clone())
        }
    }

    /// Trigram provider that records the size of every embed_batch call.
    #[derive(Debug)]
    struct CountingEmbedder {
        inner: TrigramProvider,
        batches: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn provider_name(&self) -> &str {
            "counting"
        }
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.len());
            self.inner.embed_batch(texts).await
        }
    }

    #[derive(Debug)]
    struct StubLlm {
        body: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl LlmClient for StubLlm {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LlmResponse {
                content: self.body.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn valid_plan_body() -> String {
        serde_json::json!({
            "issue_summary": "Synthesized summary.",
            "likely_causes": ["cause"],
            "plan_overview": ["overview"],
            "steps": [{
                "id": "S1",
                "title": "Do the thing",
                "rationale": "because",
                "action": "do it",
                "expect": "it works"
            }],
            "confidence": 0.75
        })
        .to_string()
    }

    fn five_results() -> Vec<SearchResult> {
        (1..=5)
            .map(|i| SearchResult {
                title: format!("Result {}", i),
                link: format!("https://example.com/page{}", i),
                snippet: "short snippet fallback text".to_string(),
            })
            .collect()
    }

    struct Harness {
        agent: Agent,
        cache: QueryCache,
        search_calls: Arc<AtomicUsize>,
        llm_calls: Arc<AtomicUsize>,
        batches: Arc<Mutex<Vec<usize>>>,
        _dir: tempfile::TempDir,
    }

    fn harness(
        results: Vec<SearchResult>,
        pages: StubPages,
        llm_body: String,
        options: AgentOptions,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cache = QueryCache::new(dir.path().join("cache.json"));

        let search_calls = Arc::new(AtomicUsize::new(0));
        let llm_calls = Arc::new(AtomicUsize::new(0));
        let batches = Arc::new(Mutex::new(Vec::new()));

        let agent = Agent::new(
            Arc::new(StubSearch {
                results,
                calls: Arc::clone(&search_calls),
            }),
            Arc::new(pages),
            Arc::new(CountingEmbedder {
                inner: TrigramProvider::new(64),
                batches: Arc::clone(&batches),
            }),
            PlanSynthesizer::new(
                Arc::new(StubLlm {
                    body: llm_body,
                    calls: Arc::clone(&llm_calls),
                }),
                "stub-model",
            ),
            cache.clone(),
            options,
        );

        Harness {
            agent,
            cache,
            search_calls,
            llm_calls,
            batches,
            _dir: dir,
        }
    }

    fn quiet_pages(page_text: &str) -> StubPages {
        StubPages {
            page_text: page_text.to_string(),
            failing: HashSet::new(),
            delay: None,
        }
    }

    #[tokio::test]
    async fn test_zero_search_results_aborts_without_caching() {
        let h = harness(
            vec![],
            quiet_pages("irrelevant"),
            valid_plan_body(),
            AgentOptions::default(),
        );

        let err = h
            .agent
            .submit(&TicketContext::new("test issue"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoResults(_)));
        assert!(h.cache.load().unwrap().is_empty());
        assert_eq!(h.llm_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_whole_pipeline() {
        let h = harness(
            five_results(),
            quiet_pages("page text"),
            valid_plan_body(),
            AgentOptions::default(),
        );

        // Pre-populate under different casing.
        let plan = TroubleshootingPlan::from_json_str(&valid_plan_body()).unwrap();
        let mut store = h.cache.load().unwrap();
        h.cache.insert(&mut store, "Printer Offline", &plan).unwrap();

        let result = h
            .agent
            .submit(&TicketContext::new("printer offline"))
            .await
            .unwrap();

        assert_eq!(result, plan);
        assert_eq!(h.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.llm_calls.load(Ordering::SeqCst), 0);
        assert!(h.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_fetch_failure_degrades_to_snippet() {
        // Four pages of 2500 chars chunk to 3 chunks each (size 1000); the
        // failing page's 27-char snippet contributes exactly one chunk.
        let mut pages = quiet_pages(&"a".repeat(2500));
        pages.failing.insert("https://example.com/page3".to_string());

        let h = harness(
            five_results(),
            pages,
            valid_plan_body(),
            AgentOptions::default(),
        );

        let plan = h
            .agent
            .submit(&TicketContext::new("printer offline"))
            .await
            .unwrap();
        assert_eq!(plan.issue_summary, "Synthesized summary.");

        let batches = h.batches.lock().unwrap();
        assert_eq!(batches[0], 4 * 3 + 1);

        // The miss ran to completion and was cached.
        let store = h.cache.load().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.lookup("PRINTER OFFLINE").is_some());
    }

    #[tokio::test]
    async fn test_results_without_urls_are_skipped() {
        let mut results = five_results();
        results[1].link = String::new();
        results[4].link = String::new();

        let h = harness(
            results,
            quiet_pages(&"b".repeat(1500)), // 2 chunks per fetched page
            valid_plan_body(),
            AgentOptions::default(),
        );

        h.agent
            .submit(&TicketContext::new("slow laptop"))
            .await
            .unwrap();

        let batches = h.batches.lock().unwrap();
        assert_eq!(batches[0], 3 * 2);
    }

    #[tokio::test]
    async fn test_invalid_llm_output_fails_without_caching() {
        let body = serde_json::json!({
            "issue_summary": "Missing everything else"
        })
        .to_string();

        let h = harness(
            five_results(),
            quiet_pages("page text"),
            body,
            AgentOptions::default(),
        );

        let err = h
            .agent
            .submit(&TicketContext::new("bluetooth pairing fails"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SchemaValidation(_)));
        assert!(h.cache.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_cancels_slow_pipeline() {
        let mut pages = quiet_pages("page text");
        pages.delay = Some(Duration::from_millis(200));

        let h = harness(
            five_results(),
            pages,
            valid_plan_body(),
            AgentOptions {
                deadline: Some(Duration::from_millis(20)),
                ..AgentOptions::default()
            },
        );

        let err = h
            .agent
            .submit(&TicketContext::new("anything"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Timeout(_)));
        assert!(h.cache.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_submit_hits_cache() {
        let h = harness(
            five_results(),
            quiet_pages(&"c".repeat(1200)),
            valid_plan_body(),
            AgentOptions::default(),
        );

        let ctx = TicketContext::new("wifi disconnects after sleep");
        let first = h.agent.submit(&ctx).await.unwrap();
        let second = h.agent.submit(&ctx).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.llm_calls.load(Ordering::SeqCst), 1);
    }
}
