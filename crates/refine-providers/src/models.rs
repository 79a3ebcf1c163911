//! Data models shared across providers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// A provider-qualified model identifier, written as `provider/model`
/// (e.g. `openai/gpt-4o`, `anthropic/claude-3-haiku-20240307`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Provider id (`openai`, `anthropic`, ...)
    pub provider: String,
    /// Model id within that provider
    pub model: String,
}

impl ModelRef {
    /// Parse a `provider/model` string
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        let (provider, model) = value
            .split_once('/')
            .ok_or_else(|| ProviderError::InvalidModel(value.to_string()))?;
        if provider.is_empty() || model.is_empty() {
            return Err(ProviderError::InvalidModel(value.to_string()));
        }
        Ok(Self {
            provider: provider.to_string(),
            model: model.to_string(),
        })
    }
}

impl Default for ModelRef {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl FromStr for ModelRef {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// One refinement request: an instruction (system prompt) plus the user
/// text to revise
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model id within the provider (no provider prefix)
    pub model: String,
    /// Instruction text sent as the system prompt
    pub system: String,
    /// User text to refine
    pub input: String,
    /// Output token cap, provider default when `None`
    pub max_tokens: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_and_model() {
        let model = ModelRef::parse("openai/gpt-4o").unwrap();
        assert_eq!(model.provider, "openai");
        assert_eq!(model.model, "gpt-4o");
        assert_eq!(model.to_string(), "openai/gpt-4o");
    }

    #[test]
    fn model_ids_may_contain_slashes_after_the_first() {
        let model = ModelRef::parse("openrouter/meta/llama-3").unwrap();
        assert_eq!(model.provider, "openrouter");
        assert_eq!(model.model, "meta/llama-3");
    }

    #[test]
    fn rejects_unqualified_model() {
        assert!(matches!(
            ModelRef::parse("gpt-4o"),
            Err(ProviderError::InvalidModel(_))
        ));
        assert!(matches!(
            ModelRef::parse("/gpt-4o"),
            Err(ProviderError::InvalidModel(_))
        ));
        assert!(matches!(
            ModelRef::parse("openai/"),
            Err(ProviderError::InvalidModel(_))
        ));
    }

    #[test]
    fn default_matches_cheapest_openai_model() {
        assert_eq!(ModelRef::default().to_string(), "openai/gpt-3.5-turbo");
    }
}
