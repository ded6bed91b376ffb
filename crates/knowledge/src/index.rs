//! Ephemeral per-query vector index.
//!
//! A flat (brute-force) L2 index over chunk embeddings, rebuilt from scratch
//! for every top-level query. The index is an owned value created and
//! destroyed within one orchestrator call; it is never shared between
//! in-flight queries and nothing survives across queries.

use crate::embeddings::EmbeddingProvider;
use std::sync::Arc;
use techmate_core::{AppError, AppResult};

/// In-memory nearest-neighbor index over one query's chunk corpus.
///
/// Invariant: the number of stored vectors equals the number of chunk texts
/// at all times.
#[derive(Debug)]
pub struct QueryIndex {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    texts: Vec<String>,
}

impl QueryIndex {
    /// Embed `chunks` and build a flat index over the vectors.
    ///
    /// An empty corpus produces an empty index; retrieval against it yields
    /// nothing. Fails with `AppError::Embedding` if the provider fails or
    /// returns vectors of mixed dimension.
    pub async fn build(
        provider: Arc<dyn EmbeddingProvider>,
        chunks: Vec<String>,
    ) -> AppResult<Self> {
        let vectors = provider.embed_batch(&chunks).await?;

        if vectors.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "provider returned {} embeddings for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimension = vectors
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| provider.dimensions());

        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dimension {
                return Err(AppError::Embedding(format!(
                    "embedding {} has dimension {}, expected {}",
                    i,
                    v.len(),
                    dimension
                )));
            }
        }

        tracing::debug!(chunks = chunks.len(), dimension, "Built query index");

        Ok(Self {
            provider,
            dimension,
            vectors,
            texts: chunks,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Return up to `top_k` chunk texts ordered by ascending L2 distance to
    /// the embedded query text.
    ///
    /// Deterministic for identical inputs and identical provider state.
    pub async fn query(&self, text: &str, top_k: usize) -> AppResult<Vec<String>> {
        Ok(self
            .query_scored(text, top_k)
            .await?
            .into_iter()
            .map(|(text, _)| text)
            .collect())
    }

    /// Like [`query`](Self::query), but keeps the distances.
    pub async fn query_scored(&self, text: &str, top_k: usize) -> AppResult<Vec<(String, f32)>> {
        if self.vectors.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self.provider.embed(text).await?;
        if query_embedding.len() != self.dimension {
            return Err(AppError::Embedding(format!(
                "query embedding has dimension {}, index has {}",
                query_embedding.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, l2_distance(&query_embedding, v)))
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        tracing::debug!(
            retrieved = scored.len(),
            requested = top_k,
            corpus = self.texts.len(),
            "Retrieved chunks"
        );

        Ok(scored
            .into_iter()
            .map(|(i, d)| (self.texts[i].clone(), d))
            .collect())
    }
}

/// Euclidean distance between two equal-length vectors.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    fn trigram() -> Arc<dyn EmbeddingProvider> {
        Arc::new(TrigramProvider::new(128))
    }

    fn corpus() -> Vec<String> {
        vec![
            "restart the printer spooler service".to_string(),
            "update the wifi adapter driver".to_string(),
            "check the ethernet cable connection".to_string(),
            "reinstall the printer driver from vendor site".to_string(),
            "disable bluetooth power saving".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_index_size_matches_corpus() {
        let index = QueryIndex::build(trigram(), corpus()).await.unwrap();
        assert_eq!(index.len(), 5);
        assert!(!index.is_empty());
    }

    #[tokio::test]
    async fn test_distances_are_non_decreasing() {
        let index = QueryIndex::build(trigram(), corpus()).await.unwrap();
        let scored = index
            .query_scored("printer driver problems", 5)
            .await
            .unwrap();

        assert!(!scored.is_empty());
        for pair in scored.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "distances out of order: {:?}", pair);
        }
    }

    #[tokio::test]
    async fn test_result_len_bounded_by_top_k_and_corpus() {
        let index = QueryIndex::build(trigram(), corpus()).await.unwrap();

        assert_eq!(index.query("printer", 3).await.unwrap().len(), 3);
        assert_eq!(index.query("printer", 50).await.unwrap().len(), 5);
        assert!(index.query("printer", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_corpus_yields_empty_result() {
        let index = QueryIndex::build(trigram(), vec![]).await.unwrap();
        assert!(index.is_empty());
        assert!(index.query("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deterministic_for_identical_inputs() {
        let index = QueryIndex::build(trigram(), corpus()).await.unwrap();
        let first = index.query("wifi adapter", 3).await.unwrap();
        let second = index.query("wifi adapter", 3).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mixed_dimensions_rejected() {
        #[derive(Debug)]
        struct BrokenProvider;

        #[async_trait::async_trait]
        impl EmbeddingProvider for BrokenProvider {
            fn provider_name(&self) -> &str {
                "broken"
            }
            fn model_name(&self) -> &str {
                "broken"
            }
            fn dimensions(&self) -> usize {
                3
            }
            async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
                // Returns a different dimension per text.
                Ok(texts
                    .iter()
                    .enumerate()
                    .map(|(i, _)| vec![0.0; 3 + i])
                    .collect())
            }
        }

        let err = QueryIndex::build(
            Arc::new(BrokenProvider),
            vec!["a".to_string(), "b".to_string()],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_nearest_text_comes_first() {
        let provider = trigram();
        let texts = corpus();
        let index = QueryIndex::build(Arc::clone(&provider), texts.clone())
            .await
            .unwrap();

        // Query with the exact text of one chunk; it must rank first with
        // distance ~0 since the provider is deterministic.
        let scored = index.query_scored(&texts[1], 5).await.unwrap();
        assert_eq!(scored[0].0, texts[1]);
        assert!(scored[0].1 < 1e-6);
    }

    #[test]
    fn test_l2_distance() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(l2_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }
}
