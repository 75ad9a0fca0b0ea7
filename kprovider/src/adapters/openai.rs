//! OpenAI chat-completions transport and adapter.
//!
//! The transport is deliberately provider-neutral: Kimi and Deepseek expose
//! the same wire protocol and reuse it with a different base URL.

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

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MAX_COMPLETION_TOKENS: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Flattens a prompt into the system / history / user message list the
    /// chat-completions protocol expects.
    pub fn from_prompt(prompt: &ChatPrompt, model: &str, temperature: Option<f32>) -> Self {
        let mut messages = Vec::with_capacity(prompt.turns.len() + 2);
        messages.push(WireMessage {
            role: "system".to_string(),
            content: prompt.system_prompt.clone(),
        });

        for turn in &prompt.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(WireMessage {
                role: role.to_string(),
                content: turn.text.clone(),
            });
        }

        messages.push(WireMessage {
            role: "user".to_string(),
            content: prompt.user_message.clone(),
        });

        Self {
            model: model.to_string(),
            messages,
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature,
            stream: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiStreamResponse {
    #[serde(default)]
    choices: Vec<ApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChoice {
    #[serde(default)]
    delta: ApiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiDelta {
    #[serde(default)]
    content: Option<String>,
}

pub trait OpenAiTransport: Send + Sync {
    fn stream_chat<'a>(
        &'a self,
        request: ChatCompletionRequest,
        api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
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

impl OpenAiTransport for OpenAiHttpTransport {
    fn stream_chat<'a>(
        &'a self,
        request: ChatCompletionRequest,
        api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            let url = self.endpoint("chat/completions");
            let response = self
                .client
                .post(url)
                .bearer_auth(api_key)
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
                        if payload == "[DONE]" {
                            if !finished {
                                finished = true;
                                yield StreamDelta::Finished;
                            }
                            break;
                        }

                        let parsed: ApiStreamResponse = serde_json::from_str(payload)
                            .map_err(|err| ProviderError::transport(err.to_string()))?;

                        if let Some(choice) = parsed.choices.first() {
                            if let Some(content) = &choice.delta.content
                                && !content.is_empty()
                            {
                                yield StreamDelta::Text(content.clone());
                            }

                            if choice.finish_reason.as_deref() == Some("stop") && !finished {
                                finished = true;
                                yield StreamDelta::Finished;
                            }
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

pub struct OpenAiChatAdapter {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    candidates: Vec<String>,
}

impl OpenAiChatAdapter {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            candidates: vec!["gpt-4o-mini".to_string()],
        }
    }

    pub fn with_model_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn default_http_transport(client: Client) -> OpenAiHttpTransport {
        OpenAiHttpTransport::new(client)
    }
}

impl ChatAdapter for OpenAiChatAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
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
            let api_key = resolve_api_key(&self.credentials, ProviderId::OpenAi)?;
            let request = ChatCompletionRequest::from_prompt(prompt, model, None);
            let deltas = self.transport.stream_chat(request, api_key).await?;
            Ok(token_stream_from_deltas(deltas, ProviderId::OpenAi))
        })
    }
}
