//! Anthropic messages-API transport and adapter.
//!
//! Unlike the OpenAI-compatible families the system prompt travels as a
//! top-level field and streaming events are typed (`content_block_delta`,
//! `message_delta`, `message_stop`).

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;
use kcommon::Role;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::adapters::{
    DeltaStream, StreamDelta, error_for_response, error_for_send, token_stream_from_deltas,
};
use crate::{
    AdapterFuture, BoxedTokenStream, ChatAdapter, ChatPrompt, ProviderError, ProviderId,
    SecureCredentialManager, resolve_api_key,
};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<WireTurn>,
    pub stream: bool,
}

impl MessagesRequest {
    pub fn from_prompt(prompt: &ChatPrompt, model: &str) -> Self {
        let mut messages = Vec::with_capacity(prompt.turns.len() + 1);
        for turn in &prompt.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(WireTurn {
                role: role.to_string(),
                content: turn.text.clone(),
            });
        }

        messages.push(WireTurn {
            role: "user".to_string(),
            content: prompt.user_message.clone(),
        });

        Self {
            model: model.to_string(),
            max_tokens: MAX_OUTPUT_TOKENS,
            system: prompt.system_prompt.clone(),
            messages,
            stream: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiStreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: ApiEventDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ApiEventDelta {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
}

pub trait AnthropicTransport: Send + Sync {
    fn stream_messages<'a>(
        &'a self,
        request: MessagesRequest,
        api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct AnthropicHttpTransport {
    client: Client,
    base_url: String,
}

impl AnthropicHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl AnthropicTransport for AnthropicHttpTransport {
    fn stream_messages<'a>(
        &'a self,
        request: MessagesRequest,
        api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            let url = self.endpoint("messages");
            let response = self
                .client
                .post(url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
                .await
                .map_err(error_for_send)?;

            if !response.status().is_success() {
                return Err(error_for_response(response).await);
            }

            let stream = try_stream! {
                let mut chunks = response.bytes_stream();
                let mut sse_buffer = String::new();
                let mut finished = false;

                while let Some(item) = chunks.next().await {
                    let bytes = item.map_err(|err| ProviderError::transport(err.to_string()))?;
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|err| ProviderError::transport(err.to_string()))?;
                    sse_buffer.push_str(text);

                    while let Some(newline_index) = sse_buffer.find('\n') {
                        let line = sse_buffer.drain(..=newline_index).collect::<String>();
                        let line = line.trim();

                        if !line.starts_with("data:") {
                            continue;
                        }

                        let payload = line.trim_start_matches("data:").trim();
                        let parsed: ApiStreamEvent = serde_json::from_str(payload)
                            .map_err(|err| ProviderError::transport(err.to_string()))?;

                        match parsed.kind.as_str() {
                            "content_block_delta" => {
                                if let Some(text) = parsed.delta.text
                                    && !text.is_empty()
                                {
                                    yield StreamDelta::Text(text);
                                }
                            }
                            "message_delta" => {
                                if parsed.delta.stop_reason.as_deref() == Some("end_turn")
                                    && !finished
                                {
                                    finished = true;
                                    yield StreamDelta::Finished;
                                }
                            }
                            "message_stop" => {
                                if !finished {
                                    finished = true;
                                    yield StreamDelta::Finished;
                                }
                            }
                            _ => {}
                        }
                    }

                    if finished {
                        break;
                    }
                }
            };

            Ok(Box::pin(stream) as DeltaStream<'a>)
        })
    }
}

pub struct AnthropicChatAdapter {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn AnthropicTransport>,
    candidates: Vec<String>,
}

impl AnthropicChatAdapter {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn AnthropicTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            candidates: vec!["claude-3-5-sonnet-20241022".to_string()],
        }
    }

    pub fn with_model_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn default_http_transport(client: Client) -> AnthropicHttpTransport {
        AnthropicHttpTransport::new(client)
    }
}

impl ChatAdapter for AnthropicChatAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model_candidates(&self) -> &[String] {
        &self.candidates
    }

    fn stream_model<'a>(
        &'a self,
        prompt: &'a ChatPrompt,
        model: &'a str,
    ) -> AdapterFuture<'a, Result<BoxedTokenStream<'a>, ProviderError>> {
        Box::pin(async move {
            prompt.validate()?;
            let api_key = resolve_api_key(&self.credentials, ProviderId::Anthropic)?;
            let request = MessagesRequest::from_prompt(prompt, model);
            let deltas = self.transport.stream_messages(request, api_key).await?;
            Ok(token_stream_from_deltas(deltas, ProviderId::Anthropic))
        })
    }
}

#[cfg(test)]
mod tests {
    use kcommon::ChatTurn;

    use super::*;

    #[test]
    fn from_prompt_keeps_system_prompt_out_of_the_message_list() {
        let prompt = ChatPrompt::new(
            "engine rules",
            vec![ChatTurn::assistant("welcome")],
            "name it GymTrack",
        );

        let request = MessagesRequest::from_prompt(&prompt, "claude-3-5-sonnet-20241022");
        assert_eq!(request.system, "engine rules");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "assistant");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "name it GymTrack");
        assert!(request.stream);
    }

    #[test]
    fn stream_event_payloads_deserialize() {
        let delta: ApiStreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"hi"}}"#,
        )
        .expect("delta event");
        assert_eq!(delta.kind, "content_block_delta");
        assert_eq!(delta.delta.text.as_deref(), Some("hi"));

        let done: ApiStreamEvent = serde_json::from_str(
            r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":12}}"#,
        )
        .expect("stop event");
        assert_eq!(done.delta.stop_reason.as_deref(), Some("end_turn"));
    }
}
