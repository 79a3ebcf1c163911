//! OpenAI provider implementation
//!
//! Streams chat completions via Server-Sent Events (SSE).

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

/// Models that reject the `system` role; the instruction is sent as an
/// `assistant` message for these.
/// https://platform.openai.com/docs/guides/reasoning/beta-limitations
const ROLE_LIMITED_MODELS: &[&str] = &["o1-preview", "o1-mini"];

/// OpenAI provider implementation
pub struct OpenAiProvider {
    api_key: String,
    client: Arc<Client>,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider instance
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, "https://api.openai.com/v1".to_string())
    }

    /// Create a new OpenAI provider with a custom base URL
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingCredentials("openai".to_string()));
        }
        Ok(Self {
            api_key,
            client: Arc::new(Client::new()),
            base_url,
        })
    }

    fn build_messages(request: &ChatRequest) -> Vec<OpenAiMessage> {
        let system_role = if ROLE_LIMITED_MODELS.contains(&request.model.as_str()) {
            "assistant"
        } else {
            "system"
        };
        vec![
            OpenAiMessage {
                role: system_role.to_string(),
                content: request.system.clone(),
            },
            OpenAiMessage {
                role: "user".to_string(),
                content: request.input.clone(),
            },
        ]
    }

    async fn send(&self, body: &OpenAiChatRequest) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI API request failed: {}", e);
                ProviderError::from(e)
            })?;

        if !response.status().is_success() {
            return Err(error_for_status(response, "openai").await);
        }
        Ok(response)
    }
}

/// Extract the text delta from one streaming SSE payload, if any
pub(crate) fn parse_stream_payload(payload: &str) -> Option<String> {
    let chunk: OpenAiStreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!("skipping unparsable OpenAI SSE event: {}", e);
            return None;
        }
    };
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty())
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let body = OpenAiChatRequest {
            model: request.model.clone(),
            messages: Self::build_messages(&request),
            max_tokens: request.max_tokens,
            stream: false,
        };
        debug!("sending completion request for model {}", request.model);

        let response = self.send(&body).await?;
        let parsed: OpenAiChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Api {
                status: 200,
                message: "no choices in response".to_string(),
            })
    }

    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream, ProviderError> {
        let body = OpenAiChatRequest {
            model: request.model.clone(),
            messages: Self::build_messages(&request),
            max_tokens: request.max_tokens,
            stream: true,
        };
        debug!("starting streaming completion for model {}", request.model);

        let response = self.send(&body).await?;
        let stream = try_stream! {
            let events = sse::data_events(sse::body_chunks(response));
            futures::pin_mut!(events);
            while let Some(payload) = events.next().await {
                let payload = payload?;
                if payload.trim() == "[DONE]" {
                    break;
                }
                if let Some(text) = parse_stream_payload(&payload) {
                    yield text;
                }
            }
        };
        Ok(stream.boxed())
    }
}

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

/// OpenAI API message format
#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

/// OpenAI streaming chunk format (Server-Sent Events)
#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_delta_text() {
        let payload = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_stream_payload(payload), Some("Hel".to_string()));
    }

    #[test]
    fn skips_empty_and_missing_deltas() {
        assert_eq!(
            parse_stream_payload(r#"{"choices":[{"delta":{"content":""}}]}"#),
            None
        );
        assert_eq!(
            parse_stream_payload(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
        assert_eq!(parse_stream_payload("not json"), None);
    }

    #[test]
    fn role_limited_models_get_assistant_instruction() {
        let request = ChatRequest {
            model: "o1-mini".to_string(),
            system: "be brief".to_string(),
            input: "hello".to_string(),
            max_tokens: None,
        };
        let messages = OpenAiProvider::build_messages(&request);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(messages[1].role, "user");

        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            ..request
        };
        let messages = OpenAiProvider::build_messages(&request);
        assert_eq!(messages[0].role, "system");
    }
}
