//! Provider trait and lookup

use std::sync::Arc;

use async_trait::async_trait;
use futures;

use crate::{
    error::ProviderError,
    models::{ChatRequest, ModelRef},
    providers::{AnthropicProvider, OpenAiProvider},
};

/// A stream of incremental text fragments terminated by stream end
pub type DeltaStream = futures::stream::BoxStream<'static, Result<String, ProviderError>>;

/// Core trait that all providers must implement
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider's unique identifier
    fn id(&self) -> &str;

    /// Send a request and wait for the full response
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;

    /// Send a request and stream the response as text deltas
    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream, ProviderError>;
}

/// Look up the provider implementation for a model reference
pub fn provider_for(
    model: &ModelRef,
    api_key: String,
) -> Result<Arc<dyn Provider>, ProviderError> {
    match model.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(api_key)?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(api_key)?)),
        other => Err(ProviderError::InvalidModel(format!(
            "unknown provider: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_providers() {
        let model = ModelRef::parse("openai/gpt-4o").unwrap();
        let provider = provider_for(&model, "key".to_string()).unwrap();
        assert_eq!(provider.id(), "openai");

        let model = ModelRef::parse("anthropic/claude-3-haiku-20240307").unwrap();
        let provider = provider_for(&model, "key".to_string()).unwrap();
        assert_eq!(provider.id(), "anthropic");
    }

    #[test]
    fn rejects_unknown_provider() {
        let model = ModelRef::parse("cohere/command-r").unwrap();
        assert!(matches!(
            provider_for(&model, "key".to_string()),
            Err(ProviderError::InvalidModel(_))
        ));
    }

    #[test]
    fn rejects_empty_api_key() {
        let model = ModelRef::parse("openai/gpt-4o").unwrap();
        assert!(matches!(
            provider_for(&model, String::new()),
            Err(ProviderError::MissingCredentials(_))
        ));
    }
}
