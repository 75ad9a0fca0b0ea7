//! Deepseek adapter over the OpenAI-compatible transport.

use std::sync::Arc;

use reqwest::Client;

use crate::adapters::openai::{ChatCompletionRequest, OpenAiHttpTransport, OpenAiTransport};
use crate::adapters::token_stream_from_deltas;
use crate::{
    AdapterFuture, BoxedTokenStream, ChatAdapter, ChatPrompt, ProviderError, ProviderId,
    SecureCredentialManager, resolve_api_key,
};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

pub struct DeepseekChatAdapter {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    candidates: Vec<String>,
}

impl DeepseekChatAdapter {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            candidates: vec!["deepseek-chat".to_string()],
        }
    }

    pub fn with_model_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn default_http_transport(client: Client) -> OpenAiHttpTransport {
        OpenAiHttpTransport::new(client).with_base_url(DEEPSEEK_BASE_URL)
    }
}

impl ChatAdapter for DeepseekChatAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Deepseek
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
            let api_key = resolve_api_key(&self.credentials, ProviderId::Deepseek)?;
            let request = ChatCompletionRequest::from_prompt(prompt, model, None);
            let deltas = self.transport.stream_chat(request, api_key).await?;
            Ok(token_stream_from_deltas(deltas, ProviderId::Deepseek))
        })
    }
}
