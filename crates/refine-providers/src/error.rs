//! Error types for the providers crate

use thiserror::Error;

/// Errors that can occur when invoking a remote model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// No API key configured for the provider. The host should offer to
    /// open its configuration surface.
    #[error("API key is not set for provider: {0}")]
    MissingCredentials(String),

    /// Rate limited by the provider. Handled transparently by the retry
    /// layer, never surfaced on its own.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The rate-limit retry cap was exceeded
    #[error("Rate limit retries exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// The operation was canceled by the caller. Silent: callers must not
    /// surface this as a failure.
    #[error("Canceled")]
    Canceled,

    /// Malformed or unsupported model identifier
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Network error occurred
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider API answered with a non-success status
    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Rate-limit failures are a distinguished error kind: the retry layer
    /// backs off and retries instead of propagating them.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::NetworkError("Request timeout".to_string())
        } else if err.is_connect() {
            ProviderError::NetworkError(err.to_string())
        } else {
            ProviderError::Internal(err.to_string())
        }
    }
}
