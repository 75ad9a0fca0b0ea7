//! Gemini generateContent transport and adapter.
//!
//! Gemini has no system role; the engine instructions travel in a
//! `systemInstruction` block and assistant turns are tagged `model`.

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

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_CANDIDATES: [&str; 2] = ["gemini-flash-latest", "gemini-pro"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirePart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<WirePart>,
}

impl WireContent {
    fn tagged(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![WirePart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateContentRequest {
    #[serde(rename = "systemInstruction")]
    pub system_instruction: WireContent,
    pub contents: Vec<WireContent>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &ChatPrompt) -> Self {
        let mut contents = Vec::with_capacity(prompt.turns.len() + 1);
        for turn in &prompt.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(WireContent::tagged(role, &turn.text));
        }

        contents.push(WireContent::tagged("user", &prompt.user_message));

        Self {
            system_instruction: WireContent {
                role: None,
                parts: vec![WirePart {
                    text: prompt.system_prompt.clone(),
                }],
            },
            contents,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiStreamChunk {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Deserialize)]
struct ApiPart {
    #[serde(default)]
    text: Option<String>,
}

pub trait GeminiTransport: Send + Sync {
    fn stream_generate<'a>(
        &'a self,
        request: GenerateContentRequest,
        model: String,
        api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct GeminiHttpTransport {
    client: Client,
    base_url: String,
}

impl GeminiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl GeminiTransport for GeminiHttpTransport {
    fn stream_generate<'a>(
        &'a self,
        request: GenerateContentRequest,
        model: String,
        api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            let url = self.endpoint(&model);
            let response = self
                .client
                .post(url)
                .header("x-goog-api-key", api_key)
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
                        let parsed: ApiStreamChunk = serde_json::from_str(payload)
                            .map_err(|err| ProviderError::transport(err.to_string()))?;

                        if let Some(candidate) = parsed.candidates.first() {
                            if let Some(content) = &candidate.content {
                                for part in &content.parts {
                                    if let Some(text) = &part.text
                                        && !text.is_empty()
                                    {
                                        yield StreamDelta::Text(text.clone());
                                    }
                                }
                            }

                            if candidate.finish_reason.as_deref() == Some("STOP") && !finished {
                                finished = true;
                                yield StreamDelta::Finished;
                            }
                        }
                    }

                    if finished {
                        break;
                    }
                }

                // Gemini sometimes closes the connection without a STOP
                // marker once generation is complete.
                if !finished {
                    yield StreamDelta::Finished;
                }
            };

            Ok(Box::pin(stream) as DeltaStream<'a>)
        })
    }
}

pub struct GeminiChatAdapter {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn GeminiTransport>,
    candidates: Vec<String>,
}

impl GeminiChatAdapter {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn GeminiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            candidates: DEFAULT_CANDIDATES
                .iter()
                .map(|model| model.to_string())
                .collect(),
        }
    }

    pub fn with_model_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn default_http_transport(client: Client) -> GeminiHttpTransport {
        GeminiHttpTransport::new(client)
    }
}

impl ChatAdapter for GeminiChatAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
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
            let api_key = resolve_api_key(&self.credentials, ProviderId::Gemini)?;
            let request = GenerateContentRequest::from_prompt(prompt);
            let deltas = self
                .transport
                .stream_generate(request, model.to_string(), api_key)
                .await?;
            Ok(token_stream_from_deltas(deltas, ProviderId::Gemini))
        })
    }
}
