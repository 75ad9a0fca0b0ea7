//! Gateway entry point: request validation, admission, prompt assembly,
//! cascade, demo fallback, and directive dispatch in one call.

use std::sync::Arc;

use kcommon::{ChatTurn, Role, SessionCode, SessionContext, SessionMode};
use kprovider::{
    AdapterHooks, ChatAdapter, ChatPrompt, NoopAdapterHooks, ProviderId, SecureCredentialManager,
};
use serde::Deserialize;

use crate::assemble::PromptAssembler;
use crate::cascade::{CascadeOrchestrator, DeliveryMode};
use crate::demo::DemoSynthesizer;
use crate::directives::{self, ControlDirective, NoopProposalSink, ProposalSink};
use crate::error::GatewayError;
use crate::ratelimit::{FixedWindowRateLimiter, RateLimiter};
use crate::relay::{Frame, FrameSink};

/// Inbound request body, matching the JSON the live client sends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub session_code: Option<String>,
    #[serde(default)]
    pub selected_project: Option<SelectedProject>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProject {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default)]
    pub live_url: Option<String>,
}

impl SelectedProject {
    fn into_subject(self) -> kcommon::SubjectRecord {
        let mut subject = kcommon::SubjectRecord::new(self.title, self.slug);
        if let Some(description) = self.description {
            subject = subject.with_description(description);
        }
        if let Some(status) = self.status {
            subject = subject.with_status(status);
        }
        if let Some(token_name) = self.token_name {
            subject = subject.with_token_name(token_name);
        }
        if let Some(live_url) = self.live_url {
            subject = subject.with_live_url(live_url);
        }
        subject
    }
}

/// What one handled request produced, for the transport layer's logging and
/// response headers. Frames have already been written to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub provider: Option<ProviderId>,
    pub is_demo: bool,
    pub directives: Vec<ControlDirective>,
    pub remaining: u32,
}

pub struct ChatGateway {
    adapters: Vec<Arc<dyn ChatAdapter>>,
    credentials: Arc<SecureCredentialManager>,
    hooks: Arc<dyn AdapterHooks>,
    delivery: DeliveryMode,
    limiter: Arc<dyn RateLimiter>,
    assembler: PromptAssembler,
    demo: DemoSynthesizer,
    proposals: Arc<dyn ProposalSink>,
}

impl ChatGateway {
    pub fn new(
        adapters: Vec<Arc<dyn ChatAdapter>>,
        credentials: Arc<SecureCredentialManager>,
    ) -> Self {
        Self {
            adapters,
            credentials,
            hooks: Arc::new(NoopAdapterHooks),
            delivery: DeliveryMode::default(),
            limiter: Arc::new(FixedWindowRateLimiter::new()),
            assembler: PromptAssembler::new(),
            demo: DemoSynthesizer::new(),
            proposals: Arc::new(NoopProposalSink),
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

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_demo_synthesizer(mut self, demo: DemoSynthesizer) -> Self {
        self.demo = demo;
        self
    }

    pub fn with_proposal_sink(mut self, proposals: Arc<dyn ProposalSink>) -> Self {
        self.proposals = proposals;
        self
    }

    /// Handles one chat request end to end, writing every outward frame to
    /// `sink`. Validation failures return before any frame is written; the
    /// transport layer answers those with `GatewayError::status()`.
    pub async fn handle(
        &self,
        request: ChatRequest,
        mode: SessionMode,
        client_key: &str,
        preferred: Option<ProviderId>,
        sink: &mut dyn FrameSink,
    ) -> Result<ChatOutcome, GatewayError> {
        let message = match request.message.as_deref() {
            Some(message) if !message.trim().is_empty() => message.to_string(),
            _ => return Err(GatewayError::invalid_request("Message is required")),
        };

        // Configuration is checked before admission so a misconfigured
        // deployment does not burn callers' rate-limit windows.
        if !self.adapters.is_empty() && !self.credentials.any_configured() {
            return Err(GatewayError::not_configured(
                "Chat service is not configured. Please contact support.",
            ));
        }

        let decision = self.limiter.admit(client_key);
        if !decision.allowed {
            tracing::warn!(
                phase = "gateway",
                event = "rate_limited",
                client_key
            );
            return Err(GatewayError::rate_limited(
                "Rate limit exceeded. Please try again later.",
            ));
        }

        let turns: Vec<ChatTurn> = request
            .history
            .iter()
            .map(|turn| {
                let role = if turn.role.eq_ignore_ascii_case("assistant") {
                    Role::Assistant
                } else {
                    Role::User
                };
                ChatTurn::new(role, turn.content.clone())
            })
            .collect();

        let session_code = request
            .session_code
            .clone()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let mut context = SessionContext::new(SessionCode::from(session_code), mode);
        if let Some(project) = request.selected_project.clone() {
            context = context.with_selected_subject(project.into_subject());
        }
        if let Some(category) = request.category.clone() {
            context = context.with_category(category);
        }

        tracing::info!(
            phase = "gateway",
            event = "request_admitted",
            mode = ?context.effective_mode(),
            session = context.session_code.as_str(),
            turns = turns.len(),
            remaining = decision.remaining
        );

        let assembled = self.assembler.assemble(&turns, &context, &message).await;
        let prompt = ChatPrompt::new(
            assembled.system_prompt,
            turns.clone(),
            assembled.effective_user_message.clone(),
        );

        let orchestrator = CascadeOrchestrator::new(self.adapters.clone(), self.credentials.clone())
            .with_hooks(self.hooks.clone())
            .with_delivery_mode(self.delivery);

        let cascade = match orchestrator.run(&prompt, preferred, sink).await {
            Ok(cascade) => cascade,
            Err(err) => {
                let _ = sink.send(&Frame::error("Failed to generate response")).await;
                return Err(err.into());
            }
        };

        let (transcript, is_demo) = match cascade.provider {
            Some(_) => (cascade.relayed_text, false),
            None => {
                let demo_text = match self
                    .demo
                    .synthesize(&turns, &assembled.effective_user_message, &context, sink)
                    .await
                {
                    Ok(demo_text) => demo_text,
                    Err(err) => {
                        let _ = sink.send(&Frame::error("Failed to generate response")).await;
                        return Err(err.into());
                    }
                };
                (demo_text, true)
            }
        };

        let found = directives::scan(&transcript);
        for directive in &found {
            if let ControlDirective::AcceptProposal(payload) = directive {
                self.proposals.proposal_accepted(payload).await;
            }
        }

        Ok(ChatOutcome {
            provider: cascade.provider,
            is_demo,
            directives: found,
            remaining: decision.remaining,
        })
    }
}
