//! Streaming with rate-limit backoff and cooperative cancellation
//!
//! Wraps a [`Provider`] stream call: rate-limit failures on stream open
//! are retried after a fixed delay up to an attempt cap, the delta
//! callback is awaited before the next fragment is pulled (backpressure),
//! and a cancellation token unwinds the operation between deltas.

use std::{future::Future, sync::Arc, time::Duration};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::ProviderError,
    models::ChatRequest,
    provider::{DeltaStream, Provider},
};

/// Retry policy for rate-limited stream-open calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total stream-open attempts before giving up
    pub max_attempts: u32,
    /// Fixed wait between attempts; no stream activity during the wait
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(30),
        }
    }
}

/// Streaming model client with transparent rate-limit retry
pub struct RetryingStreamClient {
    provider: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl RetryingStreamClient {
    /// Create a client around a provider
    pub fn new(provider: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Stream one request to completion, invoking `on_delta` once per
    /// incoming fragment in arrival order. Returns the full accumulated
    /// text.
    ///
    /// The callback future is awaited before the next fragment is
    /// requested, so a slow consumer backpressures the stream. After
    /// `cancel` fires, the next fragment fails the call with
    /// [`ProviderError::Canceled`]; callers treat that as a silent abort,
    /// not an error to surface.
    pub async fn stream<F, Fut>(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> Result<String, ProviderError>
    where
        F: FnMut(String) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let mut deltas = self.open_with_retry(&request).await?;
        let mut content = String::new();

        while let Some(delta) = deltas.next().await {
            let delta = delta?;
            if cancel.is_cancelled() {
                debug!("stream canceled after {} bytes", content.len());
                return Err(ProviderError::Canceled);
            }
            content.push_str(&delta);
            on_delta(delta).await;
        }

        debug!("stream complete: {} bytes", content.len());
        Ok(content)
    }

    /// Open the stream, retrying the entire open call on rate limiting.
    /// Any other error propagates immediately.
    async fn open_with_retry(&self, request: &ChatRequest) -> Result<DeltaStream, ProviderError> {
        let mut attempt = 1u32;
        loop {
            match self.provider.stream(request.clone()).await {
                Ok(stream) => return Ok(stream),
                Err(err) if err.is_rate_limit() => {
                    if attempt >= self.policy.max_attempts {
                        warn!("rate limit retries exhausted after {} attempts", attempt);
                        return Err(ProviderError::RetryExhausted { attempts: attempt });
                    }
                    warn!(
                        "rate limited ({}), retrying in {:?} (attempt {}/{})",
                        err, self.policy.delay, attempt, self.policy.max_attempts
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;

    /// Provider that plays back a scripted sequence of stream-open
    /// results.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<Vec<&'static str>, ProviderError>>>,
        opens: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Vec<&'static str>, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script),
                opens: Mutex::new(0),
            }
        }

        fn opens(&self) -> u32 {
            *self.opens.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: ChatRequest) -> Result<String, ProviderError> {
            unimplemented!("tests stream only")
        }

        async fn stream(&self, _request: ChatRequest) -> Result<DeltaStream, ProviderError> {
            *self.opens.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().remove(0);
            let deltas = next?;
            Ok(stream::iter(
                deltas.into_iter().map(|d| Ok(d.to_string())).collect::<Vec<_>>(),
            )
            .boxed())
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            system: "instruction".to_string(),
            input: "input".to_string(),
            max_tokens: None,
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn forwards_deltas_in_arrival_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec!["Hel", "lo, ", "world"])]));
        let client = RetryingStreamClient::new(provider, fast_policy(5));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = Arc::clone(&seen);
        let full = client
            .stream(request(), &CancellationToken::new(), move |delta| {
                let seen = Arc::clone(&seen_in_cb);
                async move {
                    seen.lock().unwrap().push(delta);
                }
            })
            .await
            .unwrap();

        assert_eq!(full, "Hello, world");
        assert_eq!(*seen.lock().unwrap(), vec!["Hel", "lo, ", "world"]);
    }

    #[tokio::test]
    async fn retries_rate_limits_until_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::RateLimited(1)),
            Err(ProviderError::RateLimited(1)),
            Err(ProviderError::RateLimited(1)),
            Ok(vec!["ok"]),
        ]));
        let client = RetryingStreamClient::new(Arc::clone(&provider) as Arc<dyn Provider>, fast_policy(5));

        let full = client
            .stream(request(), &CancellationToken::new(), |_| async {})
            .await
            .unwrap();

        assert_eq!(full, "ok");
        assert_eq!(provider.opens(), 4);
    }

    #[tokio::test]
    async fn exhausting_the_attempt_cap_fails() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::RateLimited(1)),
            Err(ProviderError::RateLimited(1)),
            Err(ProviderError::RateLimited(1)),
        ]));
        let client = RetryingStreamClient::new(provider, fast_policy(3));

        let err = client
            .stream(request(), &CancellationToken::new(), |_| async {})
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::RetryExhausted { attempts: 3 });
    }

    #[tokio::test]
    async fn non_rate_limit_errors_propagate_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::NetworkError("reset".to_string()),
        )]));
        let client = RetryingStreamClient::new(Arc::clone(&provider) as Arc<dyn Provider>, fast_policy(5));

        let err = client
            .stream(request(), &CancellationToken::new(), |_| async {})
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::NetworkError(_)));
        assert_eq!(provider.opens(), 1);
    }

    #[tokio::test]
    async fn cancellation_unwinds_before_the_next_delta() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec!["first", "second"])]));
        let client = RetryingStreamClient::new(provider, fast_policy(5));

        let cancel = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = Arc::clone(&seen);
        let cancel_in_cb = cancel.clone();
        let err = client
            .stream(request(), &cancel, move |delta| {
                let seen = Arc::clone(&seen_in_cb);
                // Cancel from inside the first callback; the second delta
                // must not be delivered.
                cancel_in_cb.cancel();
                async move {
                    seen.lock().unwrap().push(delta);
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::Canceled);
        assert_eq!(*seen.lock().unwrap(), vec!["first"]);
    }
}
