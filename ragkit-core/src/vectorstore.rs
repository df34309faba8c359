//! Vector store trait and collection schema types.

use async_trait::async_trait;

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// The approximate-nearest-neighbor index type of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    /// Exact brute-force search.
    Flat,
    /// Inverted-file index over flat vectors.
    IvfFlat,
    /// Hierarchical navigable small-world graph.
    Hnsw,
}

impl IndexType {
    /// The wire name used by vector store backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Flat => "FLAT",
            IndexType::IvfFlat => "IVF_FLAT",
            IndexType::Hnsw => "HNSW",
        }
    }
}

/// The similarity metric of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    /// Cosine similarity (higher is more similar).
    Cosine,
    /// Euclidean distance (scores are negated so higher stays more similar).
    L2,
    /// Inner product.
    InnerProduct,
}

impl MetricType {
    /// The wire name used by vector store backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Cosine => "COSINE",
            MetricType::L2 => "L2",
            MetricType::InnerProduct => "IP",
        }
    }
}

/// The schema of a named collection.
///
/// Resolved once at startup from configuration and never mutated: all
/// vectors in a collection share the same dimensionality and metric, and
/// changing either requires a new collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// The collection name, referenced by every ingest and search call.
    pub name: String,
    /// Optional database the collection lives in (backends that have one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Embedding dimensionality of every vector in the collection.
    pub dimension: usize,
    /// The ANN index type.
    pub index_type: IndexType,
    /// The similarity metric.
    pub metric: MetricType,
}

/// A storage backend for vector embeddings with similarity search.
///
/// The pipeline treats the store as a remote service: its indexing and
/// compaction internals are its own concern. Implementations must be safe
/// for concurrent use by multiple in-flight queries.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.ensure_collection(&spec).await?;
/// store.insert(&spec.name, &chunks).await?;
/// let results = store.search(&spec.name, &query_embedding, 2).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Verify connectivity with a lightweight metadata call.
    ///
    /// Run eagerly at startup; failure is fatal — the system refuses to
    /// serve if the store is unreachable.
    async fn ping(&self) -> Result<()>;

    /// Create the collection if it does not exist. Idempotent.
    ///
    /// Fails with [`RagError::SchemaConflict`](crate::RagError::SchemaConflict)
    /// if an existing collection has a conflicting dimension or metric.
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()>;

    /// Bulk-insert chunks. Chunks must have embeddings set.
    ///
    /// At-least-once semantics: chunks carry no unique key, so duplicate
    /// inserts of the same chunk add duplicate rows.
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns at most `top_k` results ordered by descending similarity
    /// score; fewer if the collection holds fewer records.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
