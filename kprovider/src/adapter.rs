//! The uniform adapter contract every upstream provider family implements.

use kcommon::BoxFuture;

use crate::{BoxedTokenStream, ChatPrompt, ProviderError, ProviderId};

pub type AdapterFuture<'a, T> = BoxFuture<'a, T>;

/// One adapter per upstream provider family. An adapter owns its transport
/// client and its ordered model candidate list (cheapest / most available
/// first); the cascade walks candidates through `stream_model`.
///
/// Adapters must not mutate session state; their only output is the token
/// event stream.
pub trait ChatAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Model identifiers to try in order before this adapter gives up.
    fn model_candidates(&self) -> &[String];

    /// Opens a live token stream against a single model candidate. Any error,
    /// at connect time or surfaced later by the stream, fails that candidate
    /// attempt only.
    fn stream_model<'a>(
        &'a self,
        prompt: &'a ChatPrompt,
        model: &'a str,
    ) -> AdapterFuture<'a, Result<BoxedTokenStream<'a>, ProviderError>>;
}
