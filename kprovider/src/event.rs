//! Token event contracts and in-memory stream utilities.
//!
//! ```rust
//! use kprovider::{BoxedTokenStream, ProviderId, TokenEvent, VecTokenStream};
//!
//! let stream = VecTokenStream::new(vec![
//!     Ok(TokenEvent::content("Welcome", ProviderId::Anthropic)),
//!     Ok(TokenEvent::done(ProviderId::Anthropic)),
//! ]);
//! let _boxed: BoxedTokenStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, ProviderId};

/// Canonical internal unit flowing from an adapter attempt to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    Content { text: String, provider: ProviderId },
    Done { provider: ProviderId },
}

impl TokenEvent {
    pub fn content(text: impl Into<String>, provider: ProviderId) -> Self {
        Self::Content {
            text: text.into(),
            provider,
        }
    }

    pub fn done(provider: ProviderId) -> Self {
        Self::Done { provider }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Content { provider, .. } | Self::Done { provider } => *provider,
        }
    }
}

/// Adapter stream contract.
///
/// Invariants for consumers:
/// - Events are emitted in upstream order.
/// - `Content` may appear zero or more times.
/// - After `Done` or an `Err` item, the stream yields nothing further for
///   that attempt.
pub trait TokenEventStream: Stream<Item = Result<TokenEvent, ProviderError>> + Send {}

impl<T> TokenEventStream for T where T: Stream<Item = Result<TokenEvent, ProviderError>> + Send {}

pub type BoxedTokenStream<'a> = Pin<Box<dyn TokenEventStream + 'a>>;

#[derive(Debug)]
pub struct VecTokenStream {
    events: VecDeque<Result<TokenEvent, ProviderError>>,
}

impl VecTokenStream {
    pub fn new(events: Vec<Result<TokenEvent, ProviderError>>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl Stream for VecTokenStream {
    type Item = Result<TokenEvent, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<TokenEvent, ProviderError>>> {
        Poll::Ready(self.events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use std::task::{RawWaker, RawWakerVTable, Waker};

    use super::*;

    #[test]
    fn vec_token_stream_yields_events_in_order_then_ends() {
        let mut stream = Box::pin(VecTokenStream::new(vec![
            Ok(TokenEvent::content("one", ProviderId::OpenAi)),
            Ok(TokenEvent::done(ProviderId::OpenAi)),
        ]));
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let first = stream.as_mut().poll_next(&mut cx);
        assert_eq!(
            first,
            Poll::Ready(Some(Ok(TokenEvent::content("one", ProviderId::OpenAi))))
        );

        let second = stream.as_mut().poll_next(&mut cx);
        assert_eq!(
            second,
            Poll::Ready(Some(Ok(TokenEvent::done(ProviderId::OpenAi))))
        );

        let end = stream.as_mut().poll_next(&mut cx);
        assert_eq!(end, Poll::Ready(None));
    }

    #[test]
    fn token_event_reports_its_provider() {
        assert_eq!(
            TokenEvent::content("hi", ProviderId::Kimi).provider(),
            ProviderId::Kimi
        );
        assert_eq!(
            TokenEvent::done(ProviderId::Gemini).provider(),
            ProviderId::Gemini
        );
    }

    fn noop_waker() -> Waker {
        unsafe fn clone(_: *const ()) -> RawWaker {
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        unsafe fn wake(_: *const ()) {}

        unsafe fn wake_by_ref(_: *const ()) {}

        unsafe fn drop(_: *const ()) {}

        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake_by_ref, drop);

        let raw_waker = RawWaker::new(std::ptr::null(), &VTABLE);
        unsafe { Waker::from_raw(raw_waker) }
    }
}
