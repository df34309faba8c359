//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-answer workflow by
//! composing a [`Chunker`], an [`EmbeddingProvider`], a [`VectorStore`], a
//! [`RerankModel`], a [`ChatModel`], and a [`PromptTemplate`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_core::{RagPipeline, RagConfig, InMemoryVectorStore, TokenChunker, PromptTemplate};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .chunker(Arc::new(TokenChunker::new(500)))
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .rerank_model(Arc::new(reranker))
//!     .chat_model(Arc::new(chat))
//!     .template(PromptTemplate::from_file("docs/system-qa.st")?)
//!     .build()?;
//!
//! pipeline.init().await?;
//! pipeline.ingest(&documents).await;
//! let answer = pipeline.answer("今夕是何年？").await?;
//! ```

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::model::{ChatModel, ChatStream};
use crate::prompt::{build_context, PromptTemplate};
use crate::reader::DocumentReader;
use crate::reranker::RerankModel;
use crate::vectorstore::VectorStore;

/// Number of chunks embedded and inserted per batch during ingestion.
///
/// Chunking is lazy; batching bounds memory for large documents while
/// keeping embedding calls amortized.
const INGEST_BATCH_SIZE: usize = 16;

/// One document's failure inside a batch ingestion.
#[derive(Debug)]
pub struct IngestFailure {
    /// The document that failed.
    pub document_id: String,
    /// Why it failed.
    pub error: RagError,
}

/// Outcome of a batch ingestion.
///
/// Ingestion failures are reported per document: one document failing does
/// not abort the batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Total chunks stored across all successfully ingested documents.
    pub stored_chunks: usize,
    /// Documents that failed, with their errors.
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// Whether every document was ingested.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The RAG pipeline orchestrator.
///
/// Holds only shared provider handles; every query's intermediate state is
/// local to the call, so queries may run concurrently without coordination.
/// Construct one via [`RagPipeline::builder()`], then call
/// [`init`](RagPipeline::init) before serving.
pub struct RagPipeline {
    config: RagConfig,
    template: PromptTemplate,
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    rerank_model: Arc<dyn RerankModel>,
    chat_model: Arc<dyn ChatModel>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Verify connectivity and resolve the collection schema.
    ///
    /// Runs eagerly at startup: pings the vector store, checks that the
    /// embedding provider's dimensionality matches the configured
    /// collection, and creates the collection if missing. Any failure is
    /// fatal — the pipeline must not serve without it.
    pub async fn init(&self) -> Result<()> {
        let provider_dims = self.embedding_provider.dimensions();
        if provider_dims != self.config.dimension {
            error!(
                configured = self.config.dimension,
                provider = provider_dims,
                "embedding dimensionality does not match collection"
            );
            return Err(RagError::DimensionMismatch {
                expected: self.config.dimension,
                actual: provider_dims,
            });
        }

        self.vector_store.ping().await.map_err(|e| {
            error!(error = %e, "vector store unreachable at startup");
            e
        })?;

        let spec = self.config.collection_spec();
        self.vector_store.ensure_collection(&spec).await?;

        info!(
            collection = %spec.name,
            dimension = spec.dimension,
            index_type = spec.index_type.as_str(),
            metric = spec.metric.as_str(),
            "pipeline initialized"
        );
        Ok(())
    }

    /// Ingest a single document: chunk → embed → insert.
    ///
    /// Chunks are consumed lazily and processed in batches. Returns the
    /// number of chunks stored. On a partial failure the chunks already
    /// inserted remain in the store — there is no transactional rollback
    /// and no cleanup; the call reports failure for the whole document.
    ///
    /// Re-running ingestion on the same document duplicates its chunks in
    /// the index; chunks carry no unique key.
    pub async fn ingest_document(&self, document: &Document) -> Result<usize> {
        let mut stored = 0;
        let mut chunks = self.chunker.split(document);

        loop {
            let batch: Vec<Chunk> = chunks.by_ref().take(INGEST_BATCH_SIZE).collect();
            if batch.is_empty() {
                break;
            }
            stored += self.ingest_batch(&document.id, batch).await?;
        }

        info!(document.id = %document.id, chunk_count = stored, "ingested document");
        Ok(stored)
    }

    /// Embed one batch of chunks and insert them.
    async fn ingest_batch(&self, document_id: &str, mut batch: Vec<Chunk>) -> Result<usize> {
        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();

        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document_id, error = %e, "embedding failed during ingestion");
            e
        })?;
        if embeddings.len() != batch.len() {
            return Err(RagError::Pipeline(format!(
                "embedding batch returned {} vectors for {} inputs",
                embeddings.len(),
                batch.len()
            )));
        }

        for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
            if embedding.len() != self.config.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: self.config.dimension,
                    actual: embedding.len(),
                });
            }
            chunk.embedding = embedding;
        }

        self.vector_store.insert(&self.config.collection, &batch).await.map_err(|e| {
            error!(document.id = %document_id, error = %e, "insert failed during ingestion");
            e
        })?;

        Ok(batch.len())
    }

    /// Ingest multiple documents, reporting failures per document.
    ///
    /// A failing document is recorded in the report and the batch
    /// continues with the next one.
    pub async fn ingest(&self, documents: &[Document]) -> IngestReport {
        let mut report = IngestReport::default();
        for document in documents {
            match self.ingest_document(document).await {
                Ok(count) => report.stored_chunks += count,
                Err(error) => {
                    error!(document.id = %document.id, error = %error, "document ingestion failed");
                    report.failures.push(IngestFailure { document_id: document.id.clone(), error });
                }
            }
        }
        report
    }

    /// Parse a resource into documents and ingest them.
    pub async fn ingest_reader(&self, reader: &dyn DocumentReader) -> Result<IngestReport> {
        let documents = reader.read()?;
        info!(document_count = documents.len(), "documents loaded");
        Ok(self.ingest(&documents).await)
    }

    /// Retrieve the `top_k` most similar chunks for a query.
    ///
    /// Embeds the query and searches the collection. No caching: every
    /// call re-embeds and re-searches.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;
        if query_embedding.len() != self.config.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.config.dimension,
                actual: query_embedding.len(),
            });
        }

        let results = self
            .vector_store
            .search(&self.config.collection, &query_embedding, top_k)
            .await
            .map_err(|e| {
                error!(collection = %self.config.collection, error = %e, "vector search failed");
                e
            })?;

        debug!(result_count = results.len(), top_k, "retrieved candidates");
        Ok(results)
    }

    /// Retrieve, rerank, and build the prompt for a query.
    async fn grounded_prompt(&self, message: &str, top_k: usize, threshold: f32) -> Result<String> {
        let candidates = self.retrieve(message, top_k).await?;
        let retained = self.rerank_model.rerank(message, candidates, threshold).await.map_err(
            |e| {
                error!(error = %e, "reranking failed");
                e
            },
        )?;

        info!(retained = retained.len(), threshold, "reranked candidates");

        let context = build_context(&retained);
        Ok(self.template.assemble(&context, message))
    }

    /// Answer a query synchronously.
    ///
    /// Retrieve → rerank (configured threshold) → inject the retained
    /// context into the template → generate.
    pub async fn answer(&self, message: &str) -> Result<String> {
        self.answer_with_top_k(message, self.config.top_k).await
    }

    /// Answer a query synchronously with a caller-supplied `top_k`,
    /// overriding the configured default.
    pub async fn answer_with_top_k(&self, message: &str, top_k: usize) -> Result<String> {
        info!(message, top_k, "answering query");
        let prompt = self.grounded_prompt(message, top_k, self.config.rerank_threshold).await?;
        self.chat_model.complete(&prompt).await.map_err(|e| {
            error!(model = self.chat_model.name(), error = %e, "generation failed");
            e
        })
    }

    /// Answer a query as a stream of content fragments.
    ///
    /// Same sequence as [`answer`](RagPipeline::answer) but with a zero
    /// rerank threshold (reorder without filtering) and a streaming
    /// generation call. Fragment errors are logged and forwarded; the
    /// stream ends only when the provider or transport ends it.
    pub async fn answer_stream(&self, message: &str) -> Result<ChatStream> {
        info!(message, "answering query (streaming)");
        let prompt = self.grounded_prompt(message, self.config.top_k, 0.0).await?;
        let stream = self.chat_model.stream(&prompt).await.map_err(|e| {
            error!(model = self.chat_model.name(), error = %e, "generation failed");
            e
        })?;

        let logged = stream.map(|fragment| match fragment {
            Ok(content) => {
                debug!(fragment_len = content.len(), "stream fragment");
                Ok(content)
            }
            Err(e) => {
                error!(error = %e, "error processing stream fragment");
                Err(e)
            }
        });
        Ok(Box::pin(logged))
    }

    /// Answer a query with manual context filtering, bypassing the rerank
    /// model.
    ///
    /// Retrieves candidates, keeps those whose raw similarity score
    /// exceeds the configured threshold (original search order, no second
    /// scoring pass), renders the template with that context, and prepends
    /// the user question to the fully composed prompt.
    pub async fn answer_with_prefilter(&self, message: &str) -> Result<String> {
        info!(message, "answering query (prefiltered)");
        let candidates = self.retrieve(message, self.config.top_k).await?;

        let threshold = self.config.rerank_threshold;
        let retained: Vec<SearchResult> = candidates
            .into_iter()
            .inspect(|r| debug!(chunk.id = %r.chunk.id, score = r.score, "candidate similarity"))
            .filter(|r| r.score > threshold)
            .collect();

        info!(retained = retained.len(), threshold, "prefiltered candidates");

        let context = build_context(&retained);
        let prompt = format!("User question: {message}\n{}", self.template.render(&context));

        self.chat_model.complete(&prompt).await.map_err(|e| {
            error!(model = self.chat_model.name(), error = %e, "generation failed");
            e
        })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All components are required. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    template: Option<PromptTemplate>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    rerank_model: Option<Arc<dyn RerankModel>>,
    chat_model: Option<Arc<dyn ChatModel>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the prompt template.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the rerank model.
    pub fn rerank_model(mut self, rerank_model: Arc<dyn RerankModel>) -> Self {
        self.rerank_model = Some(rerank_model);
        self
    }

    /// Set the generation model.
    pub fn chat_model(mut self, chat_model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(chat_model);
        self
    }

    /// Build the [`RagPipeline`], validating that all components are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any component is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let template =
            self.template.ok_or_else(|| RagError::Config("template is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let rerank_model = self
            .rerank_model
            .ok_or_else(|| RagError::Config("rerank_model is required".to_string()))?;
        let chat_model =
            self.chat_model.ok_or_else(|| RagError::Config("chat_model is required".to_string()))?;

        Ok(RagPipeline {
            config,
            template,
            chunker,
            embedding_provider,
            vector_store,
            rerank_model,
            chat_model,
        })
    }
}
