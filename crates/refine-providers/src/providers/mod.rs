//! Concrete provider implementations

pub mod anthropic;
pub mod openai;
pub(crate) mod sse;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::error::ProviderError;

/// Map a non-success HTTP response to the provider error taxonomy.
///
/// 429 becomes the distinguished rate-limit kind (honoring `Retry-After`
/// when present) so the retry layer can back off; 401 points the user at
/// their credentials.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
    provider: &str,
) -> ProviderError {
    let status = response.status().as_u16();
    match status {
        401 | 403 => ProviderError::MissingCredentials(provider.to_string()),
        429 => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(30);
            ProviderError::RateLimited(retry_after)
        }
        _ => {
            let message = response.text().await.unwrap_or_default();
            ProviderError::Api { status, message }
        }
    }
}
