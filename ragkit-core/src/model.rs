//! Generation model trait and streaming response type.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// A stream of generated content fragments.
///
/// Forward-only and single-pass: consumers append fragments in arrival
/// order to reconstruct the full response. The stream terminates when the
/// provider signals end-of-response, or abruptly on transport failure —
/// fragments already delivered are not retracted. Consumption is
/// pull-driven, so a slow consumer applies backpressure rather than
/// buffering without bound; dropping the stream cancels the underlying
/// transport.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A generation model that turns a prompt into a response.
///
/// Implementations wrap a language-model provider behind a minimal
/// capability interface so any concrete provider can be substituted
/// without touching pipeline logic.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a complete response for the prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Generate a response as an incremental stream of fragments.
    async fn stream(&self, prompt: &str) -> Result<ChatStream>;
}
