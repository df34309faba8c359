//! Provider endpoint configuration.

/// Connection settings for an OpenAI-compatible API.
///
/// Covers the standard OpenAI endpoint and compatible servers (Ollama,
/// vLLM, DashScope, ...) via a base URL override.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
}

impl ProviderConfig {
    /// The standard OpenAI API base URL.
    pub const OPENAI_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Create a config for the standard OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::OPENAI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Create a config for a compatible API at a custom base URL.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { api_key: api_key.into(), base_url, model: model.into() }
    }
}
