use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const SYSTEM_PROMPT: &str =
    "You are a friendly early-childhood educator who designs short, safe, playful learning activities.";

/// Why a single call to the text generator produced nothing usable.
///
/// Every variant is recoverable: call sites match on it and switch to their
/// deterministic fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallFailure {
    #[error("Text generation is disabled")]
    Disabled,
    #[error("Text generation service unavailable: {0}")]
    Unavailable(String),
    #[error("Text generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Text generation returned no content")]
    EmptyResponse,
    #[error("Text generation returned malformed output: {0}")]
    Malformed(String),
}

/// A generic prompt-in, text-out client for an external generative service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Makes a single, non-streaming call. No retries.
    async fn generate(&self, prompt: &str) -> Result<String, CallFailure>;
}

/// Defines the supported backends for text generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    Disabled,
}

impl Provider {
    /// Parses a provider name. Unknown names select OpenAI.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "disabled" | "none" | "off" => Provider::Disabled,
            _ => Provider::OpenAI,
        }
    }

    /// Base URL of the provider's OpenAI-compatible endpoint.
    pub fn api_base(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("https://api.openai.com/v1/"),
            Provider::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Provider::Disabled => None,
        }
    }
}

/// An implementation of `TextGenerator` for any OpenAI-compatible API.
pub struct OpenAICompatibleGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleGenerator {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAICompatibleGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CallFailure> {
        let unavailable = |e: async_openai::error::OpenAIError| CallFailure::Unavailable(e.to_string());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(unavailable)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(unavailable)?
                    .into(),
            ])
            .build()
            .map_err(unavailable)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(unavailable)?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(CallFailure::EmptyResponse)
    }
}

/// A generator that always reports itself disabled. Every caller takes its
/// fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CallFailure> {
        Err(CallFailure::Disabled)
    }
}

/// Builds the generator for `provider`.
///
/// An API key is required for every provider except `Disabled`.
pub fn generator_for(
    provider: Provider,
    api_key: Option<&str>,
    model: &str,
) -> Result<Arc<dyn TextGenerator>> {
    let Some(api_base) = provider.api_base() else {
        info!("Text generation disabled; all activities will use templates.");
        return Ok(Arc::new(DisabledGenerator));
    };
    let api_key = api_key.with_context(|| format!("An API key is required for the {provider:?} provider"))?;
    info!(?provider, model = %model, "Using OpenAI-compatible text generation.");
    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base);
    Ok(Arc::new(OpenAICompatibleGenerator::new(config, model.to_string())))
}

/// Runs one generator call under a deadline.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
) -> Result<String, CallFailure> {
    match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(CallFailure::Timeout(timeout)),
    }
}

/// Parses a reply that is supposed to hold a JSON object.
///
/// Models like to wrap JSON in markdown fences or surround it with chatter, so
/// the outermost `{ ... }` span is extracted before parsing.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T, CallFailure> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let body = match (start, end) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => return Err(CallFailure::Malformed("no JSON object in reply".to_string())),
    };
    serde_json::from_str(body).map_err(|e| CallFailure::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        activity: String,
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, CallFailure> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("Gemini"), Provider::Gemini);
        assert_eq!(Provider::parse("disabled"), Provider::Disabled);
        assert_eq!(Provider::parse("openai"), Provider::OpenAI);
        assert_eq!(Provider::parse("something-else"), Provider::OpenAI);
        assert_eq!(Provider::Disabled.api_base(), None);
    }

    #[test]
    fn test_parse_json_reply_strips_fences() {
        let raw = "Sure! Here you go:\n```json\n{\"activity\": \"Build a paper robot\"}\n```";
        let reply: Reply = parse_json_reply(raw).unwrap();
        assert_eq!(reply.activity, "Build a paper robot");
    }

    #[test]
    fn test_parse_json_reply_rejects_prose() {
        let err = parse_json_reply::<Reply>("I cannot help with that.").unwrap_err();
        assert!(matches!(err, CallFailure::Malformed(_)));

        let err = parse_json_reply::<Reply>("{\"unexpected\": true}").unwrap_err();
        assert!(matches!(err, CallFailure::Malformed(_)));
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        assert!(generator_for(Provider::OpenAI, None, "gpt-4o").is_err());
        assert!(generator_for(Provider::Disabled, None, "gpt-4o").is_ok());
    }

    #[tokio::test]
    async fn test_disabled_generator_always_fails() {
        let result = DisabledGenerator.generate("anything").await;
        assert_eq!(result, Err(CallFailure::Disabled));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let timeout = Duration::from_millis(20);
        let result = generate_with_timeout(&SlowGenerator, "prompt", timeout).await;
        assert_eq!(result, Err(CallFailure::Timeout(timeout)));
    }

    #[tokio::test]
    async fn test_mock_generator_passes_through() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|prompt| Ok(format!("echo: {prompt}")));
        let result = generate_with_timeout(&mock, "hi", Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), "echo: hi");
    }
}
