//! Upstream chat-provider adapters for the Kintsugi gateway.
//!
//! Every provider family is reduced to one uniform [`ChatAdapter`] surface:
//! an ordered model-candidate list plus a single-candidate streaming call
//! that yields [`TokenEvent`]s. The caller owns retry and fallback; adapters
//! own credentials, wire protocol, and provider tagging.
//!
//! ```
//! use kprovider::{BoxedTokenStream, ProviderId, TokenEvent, VecTokenStream};
//!
//! let stream = VecTokenStream::new(vec![
//!     Ok(TokenEvent::content("hello", ProviderId::Anthropic)),
//!     Ok(TokenEvent::done(ProviderId::Anthropic)),
//! ]);
//! let _boxed: BoxedTokenStream<'static> = Box::pin(stream);
//! ```

mod adapter;
pub mod adapters;
mod credentials;
mod descriptor;
mod error;
mod event;
mod hooks;
mod model;
mod registry;

pub use adapter::{AdapterFuture, ChatAdapter};
pub use credentials::{SecureCredentialManager, SecretString, resolve_api_key};
pub use descriptor::{
    DEFAULT_PROVIDER, PRIORITY_ORDER, ProviderDescriptor, priority_of, trial_order,
};
pub use error::{ProviderError, ProviderErrorKind};
pub use event::{BoxedTokenStream, TokenEvent, TokenEventStream, VecTokenStream};
pub use model::{ChatPrompt, ProviderId};
pub use registry::AdapterBuildConfig;
#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
pub use registry::{build_adapters_with_config, build_default_adapters};

pub use hooks::{AdapterHooks, NoopAdapterHooks, TracingAdapterHooks};

pub mod prelude {
    pub use crate::{
        AdapterHooks, BoxedTokenStream, ChatAdapter, ChatPrompt, ProviderError, ProviderErrorKind,
        ProviderId, SecureCredentialManager, TokenEvent, TokenEventStream,
    };
}
