//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionSpec, IndexType, MetricType};

/// Configuration parameters for the RAG pipeline.
///
/// Resolved once at startup and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Vector store host.
    pub host: String,
    /// Vector store port.
    pub port: u16,
    /// Database holding the collection, for backends that have one.
    pub database: Option<String>,
    /// Collection name used by every ingest and search call.
    pub collection: String,
    /// Embedding dimensionality of the collection.
    pub dimension: usize,
    /// ANN index type declared at collection creation.
    pub index_type: IndexType,
    /// Similarity metric declared at collection creation.
    pub metric: MetricType,
    /// Maximum estimated tokens per chunk.
    pub max_tokens: usize,
    /// Number of top results requested from vector search.
    ///
    /// Deliberately small: downstream reranking and prompt-length limits
    /// favor precision over recall.
    pub top_k: usize,
    /// Rerank score threshold for the synchronous answer path.
    pub rerank_threshold: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 19530,
            database: None,
            collection: "rag_chunks".to_string(),
            dimension: 1536,
            index_type: IndexType::IvfFlat,
            metric: MetricType::Cosine,
            max_tokens: 500,
            top_k: 2,
            rerank_threshold: 0.8,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The collection schema implied by this configuration.
    pub fn collection_spec(&self) -> CollectionSpec {
        CollectionSpec {
            name: self.collection.clone(),
            database: self.database.clone(),
            dimension: self.dimension,
            index_type: self.index_type,
            metric: self.metric,
        }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the vector store host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the vector store port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.config.collection = collection.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.config.dimension = dimension;
        self
    }

    /// Set the ANN index type.
    pub fn index_type(mut self, index_type: IndexType) -> Self {
        self.config.index_type = index_type;
        self
    }

    /// Set the similarity metric.
    pub fn metric(mut self, metric: MetricType) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the maximum estimated tokens per chunk.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the number of top results requested from vector search.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    /// Set the rerank threshold for the synchronous answer path.
    pub fn rerank_threshold(mut self, threshold: f32) -> Self {
        self.config.rerank_threshold = threshold;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `top_k`, `dimension`, or
    /// `max_tokens` is zero.
    pub fn build(self) -> Result<RagConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.dimension == 0 {
            return Err(RagError::Config("dimension must be greater than zero".to_string()));
        }
        if self.config.max_tokens == 0 {
            return Err(RagError::Config("max_tokens must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}
