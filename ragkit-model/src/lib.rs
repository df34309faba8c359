//! # ragkit-model
//!
//! HTTP model providers for the `ragkit-core` pipeline:
//!
//! - [`OpenAIEmbedding`] — OpenAI-compatible `/embeddings`
//! - [`OpenAIChat`] — OpenAI-compatible `/chat/completions`, synchronous
//!   and SSE streaming
//! - [`CohereRerank`] — Cohere-compatible `/rerank`
//!
//! All clients take a [`ProviderConfig`] and accept compatible servers
//! (Ollama, vLLM, DashScope, ...) via a base URL override.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_model::{CohereRerank, OpenAIChat, OpenAIEmbedding};
//!
//! let pipeline = ragkit_core::RagPipeline::builder()
//!     .embedding_provider(Arc::new(OpenAIEmbedding::from_env()?))
//!     .chat_model(Arc::new(OpenAIChat::from_env()?))
//!     .rerank_model(Arc::new(CohereRerank::from_env()?))
//!     // ...
//!     .build()?;
//! ```

pub mod chat;
pub mod config;
pub mod embedding;
pub mod rerank;

pub use chat::OpenAIChat;
pub use config::ProviderConfig;
pub use embedding::OpenAIEmbedding;
pub use rerank::CohereRerank;
