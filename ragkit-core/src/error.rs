//! Error types for the `ragkit-core` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The vector store could not be reached.
    ///
    /// Fatal at startup; surfaced as service-unavailable if it recurs at
    /// query time.
    #[error("Connection error ({backend}): {message}")]
    Connection {
        /// The vector store backend that could not be reached.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An existing collection's schema conflicts with the configured one.
    ///
    /// Requires operator intervention; a collection's dimensionality and
    /// metric are fixed at creation time.
    #[error("Schema conflict in collection '{collection}': {message}")]
    SchemaConflict {
        /// The collection with the conflicting schema.
        collection: String,
        /// What differs between the configured and the existing schema.
        message: String,
    },

    /// An embedding's length does not match the collection dimensionality.
    ///
    /// This is a configuration error and fails fast at first use; vectors
    /// are never truncated or padded to fit.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The collection's declared dimensionality.
        expected: usize,
        /// The actual vector length produced.
        actual: usize,
    },

    /// The embedding provider call failed.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation provider call failed.
    #[error("Generation unavailable ({provider}): {message}")]
    GenerationUnavailable {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The rerank provider call failed.
    #[error("Rerank error ({provider}): {message}")]
    Rerank {
        /// The rerank provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector store operation failed.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking or parsing.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
