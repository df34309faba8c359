//! OpenAI-compatible chat client with synchronous and streaming generation.

use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use ragkit_core::{ChatModel, ChatStream, RagError, Result};

use crate::config::ProviderConfig;

/// The default chat model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// The SSE payload marking end-of-response.
const STREAM_DONE: &str = "[DONE]";

/// A [`ChatModel`] backed by an OpenAI-compatible `/chat/completions`
/// endpoint.
///
/// Synchronous calls return the complete response text; streaming calls
/// decode the server-sent event stream into content fragments as they
/// arrive. Dropping the stream closes the underlying connection.
///
/// # Example
///
/// ```rust,ignore
/// use futures::StreamExt;
/// use ragkit_model::OpenAIChat;
///
/// let chat = OpenAIChat::new("sk-...")?;
/// let text = chat.complete("hello").await?;
///
/// let mut stream = chat.stream("hello").await?;
/// while let Some(fragment) = stream.next().await {
///     print!("{}", fragment?);
/// }
/// ```
#[derive(Debug)]
pub struct OpenAIChat {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAIChat {
    /// Create a new client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ProviderConfig::new(api_key, DEFAULT_MODEL))
    }

    /// Create a new client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| RagError::GenerationUnavailable {
                provider: DEFAULT_MODEL.into(),
                message: "OPENAI_API_KEY environment variable not set".into(),
            })?;
        Self::new(api_key)
    }

    /// Create a new client from a full [`ProviderConfig`].
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::GenerationUnavailable {
                provider: config.model,
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self { client: reqwest::Client::new(), config })
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    fn unavailable(&self, message: impl Into<String>) -> RagError {
        RagError::GenerationUnavailable { provider: self.config.model.clone(), message: message.into() }
    }

    /// Send a completion request, optionally streamed.
    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![Message { role: "user", content: prompt }],
            stream,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.config.model, error = %e, "request failed");
                self.unavailable(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.config.model, %status, "API error");
            return Err(self.unavailable(format!("API returned {status}: {body}")));
        }
        Ok(response)
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAIChat {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "completion request");

        let response = self.send(prompt, false).await?;
        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.unavailable("API returned no choices"))
    }

    async fn stream(&self, prompt: &str) -> Result<ChatStream> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "streaming request");

        let response = self.send(prompt, true).await?;
        let model = self.config.model.clone();
        let mut events = response.bytes_stream().eventsource();

        let stream = try_stream! {
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| {
                    error!(model = %model, error = %e, "stream transport error");
                    RagError::GenerationUnavailable {
                        provider: model.clone(),
                        message: format!("stream error: {e}"),
                    }
                })?;

                if event.data == STREAM_DONE {
                    break;
                }

                // A malformed fragment is logged and skipped; only the
                // transport ends the stream.
                match serde_json::from_str::<StreamChunk>(&event.data) {
                    Ok(chunk) => {
                        if let Some(content) =
                            chunk.choices.into_iter().next().and_then(|c| c.delta.content)
                        {
                            if !content.is_empty() {
                                yield content;
                            }
                        }
                    }
                    Err(e) => {
                        error!(model = %model, error = %e, "failed to decode stream fragment");
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
