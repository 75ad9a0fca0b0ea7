//! Behavior tests for the uniform adapter surface using fake transports.

use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use kprovider::adapters::openai::{ChatCompletionRequest, OpenAiChatAdapter, OpenAiTransport};
use kprovider::adapters::{DeltaStream, StreamDelta};
use kprovider::{
    AdapterFuture, ChatAdapter, ChatPrompt, ProviderError, ProviderErrorKind, ProviderId,
    SecureCredentialManager, TokenEvent,
};

struct FakeOpenAiTransport {
    deltas: Vec<Result<StreamDelta, ProviderError>>,
    seen: Mutex<Vec<ChatCompletionRequest>>,
}

impl FakeOpenAiTransport {
    fn new(deltas: Vec<Result<StreamDelta, ProviderError>>) -> Self {
        Self {
            deltas,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.seen.lock().expect("test lock").clone()
    }
}

impl OpenAiTransport for FakeOpenAiTransport {
    fn stream_chat<'a>(
        &'a self,
        request: ChatCompletionRequest,
        _api_key: String,
    ) -> AdapterFuture<'a, Result<DeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.seen.lock().expect("test lock").push(request);
            let deltas = self.deltas.clone();
            Ok(Box::pin(futures_util::stream::iter(deltas)) as DeltaStream<'a>)
        })
    }
}

fn configured_credentials() -> Arc<SecureCredentialManager> {
    let credentials = SecureCredentialManager::new();
    credentials
        .set_api_key(ProviderId::OpenAi, "sk-test")
        .expect("store key");
    Arc::new(credentials)
}

#[tokio::test]
async fn adapter_tags_content_and_done_with_its_provider() {
    let transport = Arc::new(FakeOpenAiTransport::new(vec![
        Ok(StreamDelta::Text("Hello".to_string())),
        Ok(StreamDelta::Text(" there".to_string())),
        Ok(StreamDelta::Finished),
    ]));
    let adapter = OpenAiChatAdapter::new(configured_credentials(), transport.clone());

    let prompt = ChatPrompt::new("system", Vec::new(), "hi");
    let mut stream = adapter
        .stream_model(&prompt, "gpt-4o-mini")
        .await
        .expect("stream should open");

    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.expect("stream item"));
    }

    assert_eq!(
        events,
        vec![
            TokenEvent::content("Hello", ProviderId::OpenAi),
            TokenEvent::content(" there", ProviderId::OpenAi),
            TokenEvent::done(ProviderId::OpenAi),
        ]
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4o-mini");
}

#[tokio::test]
async fn missing_credentials_fail_before_the_transport_is_touched() {
    let transport = Arc::new(FakeOpenAiTransport::new(vec![Ok(StreamDelta::Finished)]));
    let adapter = OpenAiChatAdapter::new(
        Arc::new(SecureCredentialManager::new()),
        transport.clone(),
    );

    let prompt = ChatPrompt::new("system", Vec::new(), "hi");
    let Err(err) = adapter.stream_model(&prompt, "gpt-4o-mini").await else {
        panic!("no key must fail");
    };

    assert_eq!(err.kind, ProviderErrorKind::Authentication);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn mid_stream_transport_failure_surfaces_as_an_error_item() {
    let transport = Arc::new(FakeOpenAiTransport::new(vec![
        Ok(StreamDelta::Text("partial".to_string())),
        Err(ProviderError::transport("connection reset")),
    ]));
    let adapter = OpenAiChatAdapter::new(configured_credentials(), transport);

    let prompt = ChatPrompt::new("system", Vec::new(), "hi");
    let mut stream = adapter
        .stream_model(&prompt, "gpt-4o-mini")
        .await
        .expect("stream should open");

    let first = stream.next().await.expect("first item").expect("content");
    assert_eq!(first, TokenEvent::content("partial", ProviderId::OpenAi));

    let second = stream.next().await.expect("second item");
    let err = second.expect_err("transport failure must surface");
    assert_eq!(err.kind, ProviderErrorKind::Transport);
    assert!(err.retryable);

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn blank_user_message_is_rejected_as_invalid_request() {
    let transport = Arc::new(FakeOpenAiTransport::new(Vec::new()));
    let adapter = OpenAiChatAdapter::new(configured_credentials(), transport);

    let prompt = ChatPrompt::new("system", Vec::new(), "   ");
    let Err(err) = adapter.stream_model(&prompt, "gpt-4o-mini").await else {
        panic!("blank message must fail");
    };
    assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
}
