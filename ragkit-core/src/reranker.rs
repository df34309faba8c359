//! Rerank model trait for re-scoring search results.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A secondary relevance model that re-scores search results.
///
/// Implementations score each (query, candidate text) pair independently of
/// the vector similarity score — cross-encoder models, LLM-based scoring,
/// or other strategies that improve precision beyond initial similarity.
#[async_trait]
pub trait RerankModel: Send + Sync {
    /// Score the relevance of `text` to `query`.
    async fn score(&self, query: &str, text: &str) -> Result<f32>;

    /// Re-score, reorder, and filter search results.
    ///
    /// Each candidate's score is replaced by the rerank score, candidates
    /// are sorted by that score descending, and candidates scoring at or
    /// below `threshold` are dropped. A threshold of 0.0 disables filtering
    /// for non-negative scorers while still reordering. An all-filtered
    /// result is an empty list, not an error.
    ///
    /// The default implementation scores candidates one at a time; override
    /// it if the backend scores a whole candidate list in one call.
    async fn rerank(
        &self,
        query: &str,
        results: Vec<SearchResult>,
        threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        let mut rescored = Vec::with_capacity(results.len());
        for mut result in results {
            result.score = self.score(query, &result.chunk.text).await?;
            rescored.push(result);
        }
        rescored
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        rescored.retain(|r| r.score > threshold);
        Ok(rescored)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    /// Scores a candidate by the number of query words it contains.
    struct WordOverlap;

    #[async_trait]
    impl RerankModel for WordOverlap {
        async fn score(&self, query: &str, text: &str) -> Result<f32> {
            let hits = query.split_whitespace().filter(|w| text.contains(w)).count();
            Ok(hits as f32)
        }
    }

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: text.to_string(),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: "doc".to_string(),
            },
            score,
        }
    }

    #[tokio::test]
    async fn rerank_orders_by_new_score_not_similarity() {
        let results = vec![result("nothing relevant", 0.99), result("rust pipeline code", 0.10)];
        let reranked = WordOverlap.rerank("rust pipeline", results, 0.0).await.unwrap();
        assert_eq!(reranked.len(), 1);
        assert_eq!(reranked[0].chunk.id, "rust pipeline code");
        assert_eq!(reranked[0].score, 2.0);
    }

    #[tokio::test]
    async fn rerank_drops_scores_at_or_below_threshold() {
        let results =
            vec![result("rust pipeline code", 0.5), result("rust only", 0.5), result("n/a", 0.5)];
        let reranked = WordOverlap.rerank("rust pipeline", results, 1.0).await.unwrap();
        assert_eq!(reranked.len(), 1);
        assert_eq!(reranked[0].chunk.id, "rust pipeline code");
    }

    #[tokio::test]
    async fn rerank_returns_empty_when_all_filtered() {
        let results = vec![result("unrelated", 0.9)];
        let reranked = WordOverlap.rerank("rust", results, 0.0).await.unwrap();
        assert!(reranked.is_empty());
    }
}
