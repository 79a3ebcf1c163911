//! Engine configuration
//!
//! One explicit object carries everything the engine reads from its
//! environment. Hosts populate it from their own settings store; nothing
//! in the engine reaches for ambient configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use refine_providers::{ModelRef, ProviderError, RetryPolicy};

/// Upper bound on tokens sent to the model per chunk
pub const DEFAULT_MAX_TOKENS_PER_CHUNK: usize = 96_000;

/// Minimum interval between non-final document writes
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(2);

/// Host-supplied engine settings
#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Model handling refinement requests
    pub model: ModelRef,
    /// API keys by provider id
    pub credentials: HashMap<String, String>,
    /// Explicit prompt file location; `None` uses the default path under
    /// the workspace root
    pub prompt_path: Option<PathBuf>,
    /// Token budget per request chunk
    pub max_tokens_per_chunk: usize,
    /// Write throttle interval
    pub throttle: Duration,
    /// Stream-open retry behavior
    pub retry: RetryPolicy,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            model: ModelRef::default(),
            credentials: HashMap::new(),
            prompt_path: None,
            max_tokens_per_chunk: DEFAULT_MAX_TOKENS_PER_CHUNK,
            throttle: DEFAULT_THROTTLE,
            retry: RetryPolicy::default(),
        }
    }
}

impl RefineConfig {
    /// API key for `provider`, or the error that tells the host to open
    /// its configuration
    pub fn credential_for(&self, provider: &str) -> Result<&str, ProviderError> {
        self.credentials
            .get(provider)
            .map(String::as_str)
            .ok_or_else(|| ProviderError::MissingCredentials(provider.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_limits() {
        let config = RefineConfig::default();
        assert_eq!(config.max_tokens_per_chunk, 96_000);
        assert_eq!(config.throttle, Duration::from_secs(2));
        assert_eq!(config.model.to_string(), "openai/gpt-3.5-turbo");
    }

    #[test]
    fn missing_credentials_name_the_provider() {
        let mut config = RefineConfig::default();
        config
            .credentials
            .insert("openai".to_string(), "sk-test".to_string());

        assert_eq!(config.credential_for("openai").unwrap(), "sk-test");
        assert!(matches!(
            config.credential_for("anthropic"),
            Err(ProviderError::MissingCredentials(p)) if p == "anthropic"
        ));
    }
}
