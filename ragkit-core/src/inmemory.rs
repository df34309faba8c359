//! In-memory vector store.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector
//! store backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and small-scale use cases.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionSpec, MetricType, VectorStore};

/// A collection's schema plus its stored rows.
///
/// Rows are a plain `Vec`: inserts append, so re-ingesting a document
/// duplicates its chunks, matching the at-least-once contract of
/// [`VectorStore::insert`].
struct Collection {
    dimension: usize,
    metric: MetricType,
    rows: Vec<Chunk>,
}

/// An in-memory [`VectorStore`] with metric-aware similarity search.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.ensure_collection(&spec).await?;
/// ```
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(collection: &str) -> RagError {
        RagError::VectorStore {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score a stored vector against the query so that higher is more similar
/// under every metric.
fn similarity(metric: MetricType, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        MetricType::Cosine => cosine_similarity(a, b),
        MetricType::InnerProduct => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        MetricType::L2 => {
            let dist: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
            -dist.sqrt()
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(&spec.name) {
            if existing.dimension != spec.dimension || existing.metric != spec.metric {
                return Err(RagError::SchemaConflict {
                    collection: spec.name.clone(),
                    message: format!(
                        "existing dimension {} / metric {} vs configured dimension {} / metric {}",
                        existing.dimension,
                        existing.metric.as_str(),
                        spec.dimension,
                        spec.metric.as_str()
                    ),
                });
            }
            return Ok(());
        }
        collections.insert(
            spec.name.clone(),
            Collection { dimension: spec.dimension, metric: spec.metric, rows: Vec::new() },
        );
        Ok(())
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        for chunk in chunks {
            if chunk.embedding.len() != store.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: store.dimension,
                    actual: chunk.embedding.len(),
                });
            }
        }
        store.rows.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;
        if embedding.len() != store.dimension {
            return Err(RagError::DimensionMismatch {
                expected: store.dimension,
                actual: embedding.len(),
            });
        }

        let mut scored: Vec<SearchResult> = store
            .rows
            .iter()
            .map(|chunk| {
                let score = similarity(store.metric, &chunk.embedding, embedding);
                SearchResult { chunk: chunk.clone(), score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
