//! Kimi (Moonshot) adapter over the OpenAI-compatible transport.

use std::sync::Arc;

use reqwest::Client;

use crate::adapters::openai::{ChatCompletionRequest, OpenAiHttpTransport, OpenAiTransport};
use crate::adapters::token_stream_from_deltas;
use crate::{
    AdapterFuture, BoxedTokenStream, ChatAdapter, ChatPrompt, ProviderError, ProviderId,
    SecureCredentialManager, resolve_api_key,
};

pub const MOONSHOT_BASE_URL: &str = "https://api.moonshot.cn/v1";

/// Largest context window first; on failure the attempt loop walks down to
/// the smaller windows.
const DEFAULT_CANDIDATES: [&str; 3] = ["moonshot-v1-128k", "moonshot-v1-32k", "moonshot-v1-8k"];

pub struct KimiChatAdapter {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    candidates: Vec<String>,
}

impl KimiChatAdapter {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
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

    pub fn default_http_transport(client: Client) -> OpenAiHttpTransport {
        OpenAiHttpTransport::new(client).with_base_url(MOONSHOT_BASE_URL)
    }
}

impl ChatAdapter for KimiChatAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Kimi
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
            let api_key = resolve_api_key(&self.credentials, ProviderId::Kimi)?;
            let request = ChatCompletionRequest::from_prompt(prompt, model, Some(0.7));
            let deltas = self.transport.stream_chat(request, api_key).await?;
            Ok(token_stream_from_deltas(deltas, ProviderId::Kimi))
        })
    }
}
