//! Anthropic provider implementation
//!
//! Streams messages via Server-Sent Events; text deltas arrive as
//! `content_block_delta` events.

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    error::ProviderError,
    models::ChatRequest,
    provider::{DeltaStream, Provider},
    providers::{error_for_status, sse},
};

/// Output cap when the caller does not set one.
/// https://docs.anthropic.com/claude/docs/models-overview
const DEFAULT_MAX_TOKENS: usize = 4096;

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider implementation
pub struct AnthropicProvider {
    api_key: String,
    client: Arc<Client>,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider instance
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, "https://api.anthropic.com/v1".to_string())
    }

    /// Create a new Anthropic provider with a custom base URL
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingCredentials("anthropic".to_string()));
        }
        Ok(Self {
            api_key,
            client: Arc::new(Client::new()),
            base_url,
        })
    }

    fn build_request(request: &ChatRequest, stream: bool) -> AnthropicRequest {
        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.input.clone(),
            }],
            stream,
        }
    }

    async fn send(&self, body: &AnthropicRequest) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic API request failed: {}", e);
                ProviderError::from(e)
            })?;

        if !response.status().is_success() {
            return Err(error_for_status(response, "anthropic").await);
        }
        Ok(response)
    }
}

/// Extract the text delta from one streaming SSE payload, if any
pub(crate) fn parse_stream_payload(payload: &str) -> Option<String> {
    let event: AnthropicStreamEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            debug!("skipping unparsable Anthropic SSE event: {}", e);
            return None;
        }
    };
    if event.event_type != "content_block_delta" {
        return None;
    }
    event
        .delta
        .and_then(|d| d.text)
        .filter(|text| !text.is_empty())
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn id(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let body = Self::build_request(&request, false);
        debug!("sending completion request for model {}", request.model);

        let response = self.send(&body).await?;
        let parsed: AnthropicResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ProviderError::Api {
                status: 200,
                message: "no content in response".to_string(),
            })
    }

    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream, ProviderError> {
        let body = Self::build_request(&request, true);
        debug!("starting streaming completion for model {}", request.model);

        let response = self.send(&body).await?;
        let stream = try_stream! {
            let events = sse::data_events(sse::body_chunks(response));
            futures::pin_mut!(events);
            while let Some(payload) = events.next().await {
                let payload = payload?;
                if let Some(text) = parse_stream_payload(&payload) {
                    yield text;
                }
            }
        };
        Ok(stream.boxed())
    }
}

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    system: String,
    messages: Vec<AnthropicMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

/// Anthropic streaming event format (Server-Sent Events)
#[derive(Debug, Deserialize)]
struct AnthropicStreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    #[serde(default)]
    text: Option<String>,
}
