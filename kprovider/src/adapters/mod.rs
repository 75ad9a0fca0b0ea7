//! Upstream provider adapter families.
//!
//! Each family owns its native wire protocol and reduces it to the shared
//! [`StreamDelta`] shape; the Kimi and Deepseek adapters ride the
//! OpenAI-compatible transport with their own base URLs and model lists.

#[cfg(feature = "provider-openai")]
pub mod openai;

#[cfg(feature = "provider-kimi")]
pub mod kimi;

#[cfg(feature = "provider-deepseek")]
pub mod deepseek;

#[cfg(feature = "provider-anthropic")]
pub mod anthropic;

#[cfg(feature = "provider-gemini")]
pub mod gemini;

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
mod wire {
    use std::pin::Pin;

    use async_stream::try_stream;
    use futures_core::Stream;
    use futures_util::StreamExt;
    use reqwest::{Response, StatusCode};

    use crate::{BoxedTokenStream, ProviderError, ProviderId, TokenEvent};

    /// Minimal unit every family transport normalizes its streaming protocol
    /// to before provider tagging happens.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StreamDelta {
        Text(String),
        Finished,
    }

    pub type DeltaStream<'a> =
        Pin<Box<dyn Stream<Item = Result<StreamDelta, ProviderError>> + Send + 'a>>;

    /// Tags a transport's delta stream with the owning provider. The stream
    /// stops after `Done`; trailing upstream noise is dropped.
    pub fn token_stream_from_deltas<'a>(
        mut deltas: DeltaStream<'a>,
        provider: ProviderId,
    ) -> BoxedTokenStream<'a> {
        let stream = try_stream! {
            while let Some(delta) = deltas.next().await {
                match delta? {
                    StreamDelta::Text(text) => yield TokenEvent::content(text, provider),
                    StreamDelta::Finished => {
                        yield TokenEvent::done(provider);
                        break;
                    }
                }
            }
        };

        Box::pin(stream)
    }

    /// Probes a JSON error body of the common `{"error": {"message": ...}}`
    /// shape; providers that wrap differently fall back to the raw status.
    pub fn extract_error_message(body: &str) -> Option<String> {
        let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
        let message = parsed.get("error")?.get("message")?.as_str()?;
        if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        }
    }

    pub async fn error_for_response(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("upstream request failed with status {status}"));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::authentication(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                ProviderError::invalid_request(message)
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                ProviderError::unavailable(message)
            }
            _ => ProviderError::transport(message),
        }
    }

    pub fn error_for_send(err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::timeout(err.to_string())
        } else {
            ProviderError::transport(err.to_string())
        }
    }
}

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
pub use wire::{
    DeltaStream, StreamDelta, error_for_response, error_for_send, extract_error_message,
    token_stream_from_deltas,
};
