//! Streaming chat gateway core for Kintsugi conversational agents.
//!
//! One [`ChatGateway::handle`] call takes a validated request through
//! admission control, prompt assembly, the provider fallback cascade, the
//! demo synthesizer when every provider is down, and directive extraction,
//! writing `data: <JSON>\n\n` frames to the caller's [`FrameSink`] along the
//! way.
//!
//! ```rust
//! use kgateway::{encode_frame, Frame, GatewayError};
//! use kprovider::ProviderId;
//!
//! let frame = Frame::content("Welcome to Kintsugi.", ProviderId::Anthropic);
//! let encoded = encode_frame(&frame).unwrap();
//! assert!(encoded.starts_with("data: {\"type\":\"content\""));
//!
//! assert_eq!(GatewayError::rate_limited("slow down").status(), 429);
//! ```

pub mod assemble;
pub mod cascade;
pub mod demo;
pub mod directives;
mod error;
pub mod gateway;
pub mod prompts;
mod ratelimit;
mod relay;

pub use assemble::{
    AssembledPrompt, IssueReader, IssueRecord, NameRegistry, ProjectDirectory, PromptAssembler,
    RepoLocator,
};
pub use cascade::{CascadeOrchestrator, CascadeResult, DeliveryMode};
pub use demo::{DemoClassification, DemoSynthesizer, classify, stage_response};
pub use directives::{ControlDirective, NoopProposalSink, ProposalSink};
pub use error::{GatewayError, GatewayErrorKind};
pub use gateway::{ChatGateway, ChatOutcome, ChatRequest, HistoryTurn, SelectedProject};
pub use ratelimit::{
    DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW, FixedWindowRateLimiter, RateLimitDecision,
    RateLimiter,
};
pub use relay::{Frame, FrameKind, FrameSink, RelayError, VecFrameSink, encode_frame};
