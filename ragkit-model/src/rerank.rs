//! Cohere-compatible rerank client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use ragkit_core::{RagError, RerankModel, Result, SearchResult};

use crate::config::ProviderConfig;

/// The default rerank model.
const DEFAULT_MODEL: &str = "rerank-v3.5";

/// The default Cohere API base URL.
const COHERE_BASE_URL: &str = "https://api.cohere.com/v2";

/// A [`RerankModel`] backed by a Cohere-compatible `/rerank` endpoint.
///
/// Cross-encoder rerank APIs (Cohere, Jina, DashScope, ...) score a whole
/// candidate list in one call, so this client overrides the batch
/// [`rerank`](RerankModel::rerank) rather than scoring one pair at a time.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_model::CohereRerank;
///
/// let reranker = CohereRerank::new("co-...")?;
/// let retained = reranker.rerank("query", candidates, 0.8).await?;
/// ```
#[derive(Debug)]
pub struct CohereRerank {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl CohereRerank {
    /// Create a new client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ProviderConfig::compatible(api_key, COHERE_BASE_URL, DEFAULT_MODEL))
    }

    /// Create a new client using the `COHERE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("COHERE_API_KEY").map_err(|_| RagError::Rerank {
            provider: DEFAULT_MODEL.into(),
            message: "COHERE_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Create a new client from a full [`ProviderConfig`].
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::Rerank {
                provider: config.model,
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self { client: reqwest::Client::new(), config })
    }

    fn rerank_err(&self, message: impl Into<String>) -> RagError {
        RagError::Rerank { provider: self.config.model.clone(), message: message.into() }
    }

    /// Score `documents` against `query`, preserving input order.
    async fn score_batch(&self, query: &str, documents: Vec<&str>) -> Result<Vec<f32>> {
        let count = documents.len();
        let request = RerankRequest { model: &self.config.model, query, documents };

        let response = self
            .client
            .post(format!("{}/rerank", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.config.model, error = %e, "rerank request failed");
                self.rerank_err(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.config.model, %status, "rerank API error");
            return Err(self.rerank_err(format!("API returned {status}: {body}")));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| self.rerank_err(format!("failed to parse response: {e}")))?;

        // The API returns results sorted by relevance; map scores back to
        // input positions.
        let mut scores = vec![0.0f32; count];
        for result in parsed.results {
            let slot = scores
                .get_mut(result.index)
                .ok_or_else(|| self.rerank_err(format!("index {} out of range", result.index)))?;
            *slot = result.relevance_score;
        }
        Ok(scores)
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<&'a str>,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

// ── RerankModel implementation ─────────────────────────────────────

#[async_trait]
impl RerankModel for CohereRerank {
    async fn score(&self, query: &str, text: &str) -> Result<f32> {
        let scores = self.score_batch(query, vec![text]).await?;
        scores.first().copied().ok_or_else(|| self.rerank_err("API returned no results"))
    }

    async fn rerank(
        &self,
        query: &str,
        results: Vec<SearchResult>,
        threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        if results.is_empty() {
            return Ok(results);
        }

        debug!(model = %self.config.model, candidates = results.len(), "reranking batch");

        let documents: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        let scores = self.score_batch(query, documents).await?;

        let mut rescored: Vec<SearchResult> = results
            .into_iter()
            .zip(scores)
            .map(|(mut result, score)| {
                result.score = score;
                result
            })
            .collect();
        rescored
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        rescored.retain(|r| r.score > threshold);
        Ok(rescored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let err = CohereRerank::new("").unwrap_err();
        assert!(matches!(err, RagError::Rerank { .. }));
    }

    #[test]
    fn response_maps_scores_by_index() {
        let parsed: RerankResponse = serde_json::from_str(
            r#"{"results":[{"index":1,"relevance_score":0.9},{"index":0,"relevance_score":0.2}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results[0].index, 1);
        assert_eq!(parsed.results[0].relevance_score, 0.9);
    }
}
