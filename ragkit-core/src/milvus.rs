//! Milvus vector store backend.
//!
//! Provides [`MilvusVectorStore`], a [`VectorStore`] speaking the Milvus
//! v2 REST API over `reqwest`. The store's indexing and compaction
//! internals stay on the server side; this client only inserts, searches,
//! and manages collection schemas.
//!
//! This module is only available when the `milvus` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_core::milvus::MilvusVectorStore;
//!
//! let store = MilvusVectorStore::new("localhost", 19530, Some("default".into()));
//! store.ping().await?;
//! store.ensure_collection(&spec).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionSpec, MetricType, VectorStore};

/// A [`VectorStore`] backed by [Milvus](https://milvus.io/).
pub struct MilvusVectorStore {
    client: reqwest::Client,
    base_url: String,
    database: Option<String>,
    /// Metric per collection, recorded at `ensure_collection` time so
    /// search results can be normalized to higher-is-more-similar.
    metrics: RwLock<HashMap<String, MetricType>>,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Serialize)]
struct CollectionRequest<'a> {
    #[serde(rename = "collectionName")]
    collection_name: &'a str,
    #[serde(rename = "dbName", skip_serializing_if = "Option::is_none")]
    db_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct DescribeData {
    #[serde(default)]
    fields: Vec<FieldSchema>,
    #[serde(default)]
    indexes: Vec<IndexSchema>,
}

#[derive(Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(default)]
    params: Vec<KeyValue>,
}

#[derive(Deserialize)]
struct IndexSchema {
    #[serde(rename = "metricType", default)]
    metric_type: String,
}

#[derive(Deserialize)]
struct KeyValue {
    key: String,
    value: String,
}

impl MilvusVectorStore {
    /// Create a store for a Milvus server at `host:port`.
    pub fn new(host: impl AsRef<str>, port: u16, database: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{}:{port}", host.as_ref()),
            database,
            metrics: RwLock::new(HashMap::new()),
        }
    }

    fn store_err(message: impl Into<String>) -> RagError {
        RagError::VectorStore { backend: "Milvus".to_string(), message: message.into() }
    }

    /// POST a JSON body to a v2 API path and decode the standard envelope.
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response =
            self.client.post(&url).json(body).send().await.map_err(|e| RagError::Connection {
                backend: "Milvus".to_string(),
                message: format!("request to {url} failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, path, "milvus API error");
            return Err(Self::store_err(format!("API returned {status}: {body}")));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Self::store_err(format!("failed to parse response: {e}")))?;
        if envelope.code != 0 {
            return Err(Self::store_err(format!(
                "server error {}: {}",
                envelope.code,
                envelope.message.unwrap_or_default()
            )));
        }
        envelope.data.ok_or_else(|| Self::store_err("response carried no data"))
    }

    fn db_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Whether the collection exists in the configured database.
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let body = match self.db_name() {
            Some(db) => json!({ "dbName": db }),
            None => json!({}),
        };
        let names: Vec<String> = self.post("/v2/vectordb/collections/list", &body).await?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Verify an existing collection's schema against the configured spec.
    async fn verify_schema(&self, spec: &CollectionSpec) -> Result<()> {
        let request = serde_json::to_value(CollectionRequest {
            collection_name: &spec.name,
            db_name: self.db_name(),
        })
        .map_err(|e| Self::store_err(e.to_string()))?;
        let described: DescribeData = self.post("/v2/vectordb/collections/describe", &request).await?;

        let dimension = described
            .fields
            .iter()
            .find(|f| f.name == "vector")
            .and_then(|f| f.params.iter().find(|p| p.key == "dim"))
            .and_then(|p| p.value.parse::<usize>().ok());
        if let Some(dim) = dimension {
            if dim != spec.dimension {
                return Err(RagError::SchemaConflict {
                    collection: spec.name.clone(),
                    message: format!(
                        "existing dimension {dim} vs configured dimension {}",
                        spec.dimension
                    ),
                });
            }
        }

        if let Some(index) = described.indexes.first() {
            if !index.metric_type.is_empty() && index.metric_type != spec.metric.as_str() {
                return Err(RagError::SchemaConflict {
                    collection: spec.name.clone(),
                    message: format!(
                        "existing metric {} vs configured metric {}",
                        index.metric_type,
                        spec.metric.as_str()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Normalize a backend distance to a higher-is-more-similar score.
    fn to_score(metric: MetricType, distance: f32) -> f32 {
        match metric {
            // Milvus reports cosine and IP as similarity already.
            MetricType::Cosine | MetricType::InnerProduct => distance,
            MetricType::L2 => -distance,
        }
    }
}

#[async_trait]
impl VectorStore for MilvusVectorStore {
    async fn ping(&self) -> Result<()> {
        let databases: Vec<String> = self.post("/v2/vectordb/databases/list", &json!({})).await?;
        info!(database_count = databases.len(), "milvus connection verified");
        Ok(())
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        if self.collection_exists(&spec.name).await? {
            self.verify_schema(spec).await?;
            debug!(collection = %spec.name, "milvus collection already exists");
        } else {
            let mut body = json!({
                "collectionName": spec.name,
                "dimension": spec.dimension,
                "metricType": spec.metric.as_str(),
                "indexParams": [{
                    "fieldName": "vector",
                    "indexName": "vector_index",
                    "metricType": spec.metric.as_str(),
                    "indexType": spec.index_type.as_str(),
                }],
            });
            if let Some(db) = self.db_name() {
                body["dbName"] = json!(db);
            }
            let _: serde_json::Value = self.post("/v2/vectordb/collections/create", &body).await?;
            info!(
                collection = %spec.name,
                dimension = spec.dimension,
                index_type = spec.index_type.as_str(),
                metric = spec.metric.as_str(),
                "created milvus collection"
            );
        }

        self.metrics.write().await.insert(spec.name.clone(), spec.metric);
        Ok(())
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let rows: Vec<serde_json::Value> = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "vector": chunk.embedding,
                    "text": chunk.text,
                    "chunk_id": chunk.id,
                    "document_id": chunk.document_id,
                    "metadata": chunk.metadata,
                })
            })
            .collect();

        let mut body = json!({ "collectionName": collection, "data": rows });
        if let Some(db) = self.db_name() {
            body["dbName"] = json!(db);
        }
        let _: serde_json::Value = self.post("/v2/vectordb/entities/insert", &body).await?;
        debug!(collection, count = chunks.len(), "inserted chunks into milvus");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let metric =
            self.metrics.read().await.get(collection).copied().unwrap_or(MetricType::Cosine);

        let mut body = json!({
            "collectionName": collection,
            "data": [embedding],
            "limit": top_k,
            "outputFields": ["text", "chunk_id", "document_id", "metadata"],
        });
        if let Some(db) = self.db_name() {
            body["dbName"] = json!(db);
        }

        let rows: Vec<serde_json::Value> = self.post("/v2/vectordb/entities/search", &body).await?;

        let results = rows
            .into_iter()
            .map(|row| {
                let distance = row["distance"].as_f64().unwrap_or_default() as f32;
                let text = row["text"].as_str().unwrap_or_default().to_string();
                let id = row["chunk_id"].as_str().unwrap_or_default().to_string();
                let document_id = row["document_id"].as_str().unwrap_or_default().to_string();
                let metadata: HashMap<String, String> = row["metadata"]
                    .as_object()
                    .map(|m| {
                        m.iter()
                            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                            .collect()
                    })
                    .unwrap_or_default();

                SearchResult {
                    chunk: Chunk { id, text, embedding: Vec::new(), metadata, document_id },
                    score: Self::to_score(metric, distance),
                }
            })
            .collect();

        Ok(results)
    }
}
