//! # ragkit-core
//!
//! A Retrieval-Augmented Generation (RAG) pipeline: ingest documents into a
//! searchable vector index, then at query time retrieve relevant passages,
//! rerank them, assemble a grounded prompt, and generate an answer —
//! synchronously or as an incremental stream.
//!
//! ## Overview
//!
//! The crate composes six seams, each behind a trait so any concrete
//! provider can be substituted without touching pipeline logic:
//!
//! - [`Chunker`] — splits a [`Document`] into bounded, ordered [`Chunk`]s
//! - [`EmbeddingProvider`] — turns text into fixed-dimension vectors
//! - [`VectorStore`] — a remote similarity-search index over collections
//! - [`RerankModel`] — secondary relevance scoring over search results
//! - [`ChatModel`] — synchronous and streaming generation
//! - [`DocumentReader`] — parses an input resource into documents
//!
//! [`RagPipeline`] wires them together for ingestion (parse → chunk →
//! embed → insert) and answering (embed → search → rerank → prompt →
//! generate). HTTP-backed providers live in the `ragkit-model` crate.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_core::{
//!     InMemoryVectorStore, PromptTemplate, RagConfig, RagPipeline, TokenChunker,
//! };
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .chunker(Arc::new(TokenChunker::new(500)))
//!     .embedding_provider(embedder)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .rerank_model(reranker)
//!     .chat_model(chat)
//!     .template(PromptTemplate::from_file("docs/system-qa.st")?)
//!     .build()?;
//!
//! pipeline.init().await?;
//! let report = pipeline.ingest_reader(&reader).await?;
//! let answer = pipeline.answer("今夕是何年？").await?;
//! let mut stream = pipeline.answer_stream("今夕是何年？").await?;
//! ```
//!
//! ## Features
//!
//! - `milvus` — [`milvus::MilvusVectorStore`], a [`VectorStore`] over the
//!   Milvus v2 REST API.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
#[cfg(feature = "milvus")]
pub mod milvus;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod reader;
pub mod reranker;
pub mod vectorstore;

pub use chunking::{estimate_tokens, Chunker, TokenChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use model::{ChatModel, ChatStream};
pub use pipeline::{IngestFailure, IngestReport, RagPipeline, RagPipelineBuilder};
pub use prompt::{build_context, PromptTemplate, CONTEXT_PLACEHOLDER};
pub use reader::{DocumentReader, PagedTextReader};
pub use reranker::RerankModel;
pub use vectorstore::{CollectionSpec, IndexType, MetricType, VectorStore};
