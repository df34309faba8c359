//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it. Batching is a
/// throughput optimization only — batch and single-item calls must produce
/// the same vectors in the same order.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::EmbeddingProvider;
///
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    ///
    /// Provider failures surface as
    /// [`RagError::EmbeddingUnavailable`](crate::RagError::EmbeddingUnavailable).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The output has the same length and order as the input. The default
    /// implementation calls [`embed`](EmbeddingProvider::embed) sequentially
    /// for each input; override it if the backend supports native batching.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    ///
    /// Must equal the target collection's declared dimensionality; the
    /// pipeline fails fast on a mismatch rather than truncating or padding.
    fn dimensions(&self) -> usize;
}
