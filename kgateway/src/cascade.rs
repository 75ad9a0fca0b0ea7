//! Ordered provider fallback orchestration.
//!
//! Adapters are tried strictly sequentially in trial order, skipping any
//! without credentials, stopping at the first attempt that produced content
//! and reached `Done`. Exhaustion is not an error here; the caller falls
//! back to the demo synthesizer.

use std::sync::Arc;

use futures_util::StreamExt;
use kprovider::{
    AdapterHooks, ChatAdapter, ChatPrompt, NoopAdapterHooks, ProviderError, ProviderId,
    SecureCredentialManager, TokenEvent, trial_order,
};

use crate::relay::{Frame, FrameSink, RelayError};

/// How attempt output reaches the client.
///
/// `CommitOnDone` buffers one attempt and only relays it after the attempt
/// completed, so a mid-stream provider failure leaves no partial reply in
/// the client transcript. `Immediate` relays tokens as they arrive; a
/// failed attempt's partial content cannot be retracted and the next
/// attempt starts a fresh reply after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[default]
    CommitOnDone,
    Immediate,
}

/// What one cascade run produced. `provider` is `None` when every adapter
/// failed; `relayed_text` is the concatenation of all content the client
/// actually saw, in order, including any immediate-mode debris.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeResult {
    pub provider: Option<ProviderId>,
    pub relayed_text: String,
}

enum AttemptOutcome {
    Committed(String),
    Failed { relayed_debris: String },
}

pub struct CascadeOrchestrator {
    adapters: Vec<Arc<dyn ChatAdapter>>,
    credentials: Arc<SecureCredentialManager>,
    hooks: Arc<dyn AdapterHooks>,
    delivery: DeliveryMode,
}

impl CascadeOrchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn ChatAdapter>>,
        credentials: Arc<SecureCredentialManager>,
    ) -> Self {
        Self {
            adapters,
            credentials,
            hooks: Arc::new(NoopAdapterHooks),
            delivery: DeliveryMode::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn AdapterHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_delivery_mode(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Runs the cascade. Only sink failures (client gone) surface as
    /// errors; provider failures advance the cascade silently.
    pub async fn run(
        &self,
        prompt: &ChatPrompt,
        preferred: Option<ProviderId>,
        sink: &mut dyn FrameSink,
    ) -> Result<CascadeResult, RelayError> {
        let order = trial_order(preferred);
        tracing::debug!(
            phase = "cascade",
            event = "trial_order",
            order = ?order.iter().map(ToString::to_string).collect::<Vec<_>>()
        );

        let mut relayed_text = String::new();

        for provider in order {
            let Some(adapter) = self
                .adapters
                .iter()
                .find(|adapter| adapter.id() == provider)
            else {
                continue;
            };

            if !self.credentials.has_credentials(provider) {
                tracing::debug!(
                    phase = "cascade",
                    event = "skip_unconfigured",
                    provider = %provider
                );
                continue;
            }

            match self.try_adapter(adapter.as_ref(), prompt, sink, &mut relayed_text).await? {
                Some(()) => {
                    tracing::info!(
                        phase = "cascade",
                        event = "provider_succeeded",
                        provider = %provider
                    );
                    return Ok(CascadeResult {
                        provider: Some(provider),
                        relayed_text,
                    });
                }
                None => continue,
            }
        }

        Ok(CascadeResult {
            provider: None,
            relayed_text,
        })
    }

    async fn try_adapter(
        &self,
        adapter: &dyn ChatAdapter,
        prompt: &ChatPrompt,
        sink: &mut dyn FrameSink,
        relayed_text: &mut String,
    ) -> Result<Option<()>, RelayError> {
        let provider = adapter.id();
        let candidates = adapter.model_candidates();

        for model in candidates {
            self.hooks.on_candidate_start(provider, model);

            match self.attempt_candidate(adapter, prompt, model, sink).await? {
                AttemptOutcome::Committed(text) => {
                    self.hooks.on_adapter_success(provider, model);
                    relayed_text.push_str(&text);
                    return Ok(Some(()));
                }
                AttemptOutcome::Failed { relayed_debris } => {
                    relayed_text.push_str(&relayed_debris);
                }
            }
        }

        self.hooks.on_adapter_exhausted(provider, candidates.len());
        Ok(None)
    }

    /// One model-candidate attempt. Success requires at least one content
    /// event and the attempt's own `Done` signal.
    async fn attempt_candidate(
        &self,
        adapter: &dyn ChatAdapter,
        prompt: &ChatPrompt,
        model: &str,
        sink: &mut dyn FrameSink,
    ) -> Result<AttemptOutcome, RelayError> {
        let provider = adapter.id();

        let mut stream = match adapter.stream_model(prompt, model).await {
            Ok(stream) => stream,
            Err(err) => {
                self.hooks.on_candidate_failed(provider, model, &err);
                return Ok(AttemptOutcome::Failed {
                    relayed_debris: String::new(),
                });
            }
        };

        let mut buffered_frames: Vec<Frame> = Vec::new();
        let mut relayed_debris = String::new();
        let mut attempt_text = String::new();
        let mut saw_content = false;
        let mut saw_done = false;
        let mut failure: Option<ProviderError> = None;

        while let Some(event) = stream.next().await {
            match event {
                Ok(TokenEvent::Content { text, provider }) => {
                    saw_content = true;
                    attempt_text.push_str(&text);
                    let frame = Frame::content(text, provider);
                    match self.delivery {
                        DeliveryMode::CommitOnDone => buffered_frames.push(frame),
                        DeliveryMode::Immediate => {
                            sink.send(&frame).await?;
                        }
                    }
                }
                Ok(TokenEvent::Done { provider }) => {
                    saw_done = true;
                    let frame = Frame::done(provider);
                    match self.delivery {
                        DeliveryMode::CommitOnDone => buffered_frames.push(frame),
                        DeliveryMode::Immediate => {
                            sink.send(&frame).await?;
                        }
                    }
                    break;
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let completed = saw_content && saw_done && failure.is_none();
        if completed {
            if self.delivery == DeliveryMode::CommitOnDone {
                for frame in &buffered_frames {
                    sink.send(frame).await?;
                }
            }
            return Ok(AttemptOutcome::Committed(attempt_text));
        }

        let err = failure.unwrap_or_else(|| {
            ProviderError::transport("stream ended without completing the reply")
        });
        self.hooks.on_candidate_failed(provider, model, &err);

        // Immediate mode already pushed partial content to the client; it
        // stays in the transcript ahead of the next attempt's fresh reply.
        if self.delivery == DeliveryMode::Immediate {
            relayed_debris = attempt_text;
        }

        Ok(AttemptOutcome::Failed { relayed_debris })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use kcommon::BoxFuture;
    use kprovider::{AdapterFuture, BoxedTokenStream, VecTokenStream};

    use super::*;
    use crate::relay::{FrameKind, VecFrameSink};

    struct ScriptedAdapter {
        id: ProviderId,
        candidates: Vec<String>,
        // One script per stream_model call, consumed in order.
        scripts: Mutex<Vec<Result<Vec<Result<TokenEvent, ProviderError>>, ProviderError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedAdapter {
        fn new(
            id: ProviderId,
            candidates: &[&str],
            scripts: Vec<Result<Vec<Result<TokenEvent, ProviderError>>, ProviderError>>,
        ) -> Self {
            Self {
                id,
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
                scripts: Mutex::new(scripts),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn succeeding(id: ProviderId, text: &str) -> Self {
            Self::new(
                id,
                &["model-a"],
                vec![Ok(vec![
                    Ok(TokenEvent::content(text, id)),
                    Ok(TokenEvent::done(id)),
                ])],
            )
        }

        fn failing(id: ProviderId) -> Self {
            Self::new(
                id,
                &["model-a"],
                vec![Err(ProviderError::unavailable("down"))],
            )
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("test lock").clone()
        }
    }

    impl ChatAdapter for ScriptedAdapter {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn model_candidates(&self) -> &[String] {
            &self.candidates
        }

        fn stream_model<'a>(
            &'a self,
            _prompt: &'a ChatPrompt,
            model: &'a str,
        ) -> AdapterFuture<'a, Result<BoxedTokenStream<'a>, ProviderError>> {
            Box::pin(async move {
                self.calls.lock().expect("test lock").push(model.to_string());
                let mut scripts = self.scripts.lock().expect("test lock");
                let script = if scripts.is_empty() {
                    Err(ProviderError::unavailable("no script"))
                } else {
                    scripts.remove(0)
                };
                drop(scripts);

                let events = script?;
                Ok(Box::pin(VecTokenStream::new(events)) as BoxedTokenStream<'a>)
            })
        }
    }

    fn credentials_for(providers: &[ProviderId]) -> Arc<SecureCredentialManager> {
        let credentials = SecureCredentialManager::new();
        for provider in providers {
            credentials
                .set_api_key(*provider, "sk-test")
                .expect("store key");
        }
        Arc::new(credentials)
    }

    fn prompt() -> ChatPrompt {
        ChatPrompt::new("system", Vec::new(), "hello")
    }

    #[tokio::test]
    async fn preferred_provider_is_tried_first_and_alone_on_success() {
        let a = Arc::new(ScriptedAdapter::failing(ProviderId::Anthropic));
        let b = Arc::new(ScriptedAdapter::succeeding(ProviderId::Kimi, "hi"));
        let orchestrator = CascadeOrchestrator::new(
            vec![a.clone(), b.clone()],
            credentials_for(&[ProviderId::Anthropic, ProviderId::Kimi]),
        );

        let mut sink = VecFrameSink::new();
        let result = orchestrator
            .run(&prompt(), Some(ProviderId::Kimi), &mut sink)
            .await
            .expect("run");

        assert_eq!(result.provider, Some(ProviderId::Kimi));
        assert!(a.calls().is_empty());
        assert_eq!(b.calls(), vec!["model-a".to_string()]);
    }

    #[tokio::test]
    async fn failed_preferred_provider_falls_through_in_priority_order() {
        let a = Arc::new(ScriptedAdapter::failing(ProviderId::Anthropic));
        let b = Arc::new(ScriptedAdapter::succeeding(ProviderId::Kimi, "hi there"));
        let orchestrator = CascadeOrchestrator::new(
            vec![a.clone(), b.clone()],
            credentials_for(&[ProviderId::Anthropic, ProviderId::Kimi]),
        );

        let mut sink = VecFrameSink::new();
        let result = orchestrator
            .run(&prompt(), Some(ProviderId::Anthropic), &mut sink)
            .await
            .expect("run");

        assert_eq!(result.provider, Some(ProviderId::Kimi));
        assert_eq!(a.calls().len(), 1);

        let done = sink.frames().last().expect("done frame");
        assert_eq!(done.kind, FrameKind::Done);
        assert_eq!(done.provider.as_deref(), Some("kimi"));
        assert_eq!(result.relayed_text, "hi there");
    }

    #[tokio::test]
    async fn unconfigured_adapters_are_skipped_without_being_invoked() {
        let a = Arc::new(ScriptedAdapter::succeeding(ProviderId::Anthropic, "never"));
        let b = Arc::new(ScriptedAdapter::succeeding(ProviderId::Gemini, "hi"));
        let orchestrator = CascadeOrchestrator::new(
            vec![a.clone(), b.clone()],
            credentials_for(&[ProviderId::Gemini]),
        );

        let mut sink = VecFrameSink::new();
        let result = orchestrator.run(&prompt(), None, &mut sink).await.expect("run");

        assert_eq!(result.provider, Some(ProviderId::Gemini));
        assert!(a.calls().is_empty());
    }

    #[tokio::test]
    async fn model_candidates_are_walked_before_the_next_adapter() {
        let kimi = Arc::new(ScriptedAdapter::new(
            ProviderId::Kimi,
            &["moonshot-v1-128k", "moonshot-v1-32k"],
            vec![
                Err(ProviderError::invalid_request("model not available")),
                Ok(vec![
                    Ok(TokenEvent::content("ok", ProviderId::Kimi)),
                    Ok(TokenEvent::done(ProviderId::Kimi)),
                ]),
            ],
        ));
        let orchestrator =
            CascadeOrchestrator::new(vec![kimi.clone()], credentials_for(&[ProviderId::Kimi]));

        let mut sink = VecFrameSink::new();
        let result = orchestrator
            .run(&prompt(), Some(ProviderId::Kimi), &mut sink)
            .await
            .expect("run");

        assert_eq!(result.provider, Some(ProviderId::Kimi));
        assert_eq!(
            kimi.calls(),
            vec!["moonshot-v1-128k".to_string(), "moonshot-v1-32k".to_string()]
        );
    }

    #[tokio::test]
    async fn commit_on_done_leaves_no_debris_from_a_mid_stream_failure() {
        let flaky = Arc::new(ScriptedAdapter::new(
            ProviderId::Anthropic,
            &["model-a"],
            vec![Ok(vec![
                Ok(TokenEvent::content("partial ", ProviderId::Anthropic)),
                Err(ProviderError::transport("connection reset")),
            ])],
        ));
        let backup = Arc::new(ScriptedAdapter::succeeding(ProviderId::Kimi, "fresh reply"));
        let orchestrator = CascadeOrchestrator::new(
            vec![flaky, backup],
            credentials_for(&[ProviderId::Anthropic, ProviderId::Kimi]),
        );

        let mut sink = VecFrameSink::new();
        let result = orchestrator.run(&prompt(), None, &mut sink).await.expect("run");

        assert_eq!(result.provider, Some(ProviderId::Kimi));
        assert_eq!(sink.content_text(), "fresh reply");
        assert_eq!(result.relayed_text, "fresh reply");
    }

    #[tokio::test]
    async fn immediate_mode_keeps_partial_content_ahead_of_the_fresh_reply() {
        let flaky = Arc::new(ScriptedAdapter::new(
            ProviderId::Anthropic,
            &["model-a"],
            vec![Ok(vec![
                Ok(TokenEvent::content("partial ", ProviderId::Anthropic)),
                Err(ProviderError::transport("connection reset")),
            ])],
        ));
        let backup = Arc::new(ScriptedAdapter::succeeding(ProviderId::Kimi, "fresh reply"));
        let orchestrator = CascadeOrchestrator::new(
            vec![flaky, backup],
            credentials_for(&[ProviderId::Anthropic, ProviderId::Kimi]),
        )
        .with_delivery_mode(DeliveryMode::Immediate);

        let mut sink = VecFrameSink::new();
        let result = orchestrator.run(&prompt(), None, &mut sink).await.expect("run");

        assert_eq!(result.provider, Some(ProviderId::Kimi));
        assert_eq!(sink.content_text(), "partial fresh reply");
        assert_eq!(result.relayed_text, "partial fresh reply");
    }

    #[tokio::test]
    async fn exhaustion_reports_no_provider_and_relays_nothing() {
        let a = Arc::new(ScriptedAdapter::failing(ProviderId::Anthropic));
        let b = Arc::new(ScriptedAdapter::failing(ProviderId::OpenAi));
        let orchestrator = CascadeOrchestrator::new(
            vec![a, b],
            credentials_for(&[ProviderId::Anthropic, ProviderId::OpenAi]),
        );

        let mut sink = VecFrameSink::new();
        let result = orchestrator.run(&prompt(), None, &mut sink).await.expect("run");

        assert_eq!(result.provider, None);
        assert!(sink.frames().is_empty());
    }

    #[tokio::test]
    async fn a_done_without_content_is_a_failed_attempt() {
        let empty = Arc::new(ScriptedAdapter::new(
            ProviderId::Anthropic,
            &["model-a"],
            vec![Ok(vec![Ok(TokenEvent::done(ProviderId::Anthropic))])],
        ));
        let orchestrator =
            CascadeOrchestrator::new(vec![empty], credentials_for(&[ProviderId::Anthropic]));

        let mut sink = VecFrameSink::new();
        let result = orchestrator.run(&prompt(), None, &mut sink).await.expect("run");

        assert_eq!(result.provider, None);
        assert!(sink.frames().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_stops_the_cascade() {
        struct ClosedSink;
        impl FrameSink for ClosedSink {
            fn send<'a>(
                &'a mut self,
                _frame: &'a Frame,
            ) -> BoxFuture<'a, Result<(), RelayError>> {
                Box::pin(async { Err(RelayError::write("client disconnected")) })
            }
        }

        let adapter = Arc::new(ScriptedAdapter::succeeding(ProviderId::Anthropic, "hi"));
        let orchestrator =
            CascadeOrchestrator::new(vec![adapter], credentials_for(&[ProviderId::Anthropic]));

        let mut sink = ClosedSink;
        let err = orchestrator
            .run(&prompt(), None, &mut sink)
            .await
            .expect_err("sink failure must surface");
        assert!(err.message.contains("client disconnected"));
    }
}
