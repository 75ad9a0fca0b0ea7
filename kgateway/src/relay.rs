//! Outward wire protocol: one `data: <JSON>\n\n` frame per event.
//!
//! ```rust
//! use kgateway::{Frame, encode_frame};
//! use kprovider::ProviderId;
//!
//! let frame = Frame::done(ProviderId::Kimi);
//! let encoded = encode_frame(&frame).unwrap();
//! assert_eq!(encoded, "data: {\"type\":\"done\",\"provider\":\"kimi\"}\n\n");
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use kcommon::BoxFuture;
use kprovider::ProviderId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Content,
    Done,
    Error,
    DemoMode,
}

/// One outward event. Optional fields serialize only when present, matching
/// the protocol the live client already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(rename = "isDemo", skip_serializing_if = "Option::is_none")]
    pub is_demo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Frame {
    fn bare(kind: FrameKind) -> Self {
        Self {
            kind,
            text: None,
            provider: None,
            is_demo: None,
            error: None,
        }
    }

    pub fn content(text: impl Into<String>, provider: ProviderId) -> Self {
        let mut frame = Self::bare(FrameKind::Content);
        frame.text = Some(text.into());
        frame.provider = Some(provider.to_string());
        frame
    }

    pub fn done(provider: ProviderId) -> Self {
        let mut frame = Self::bare(FrameKind::Done);
        frame.provider = Some(provider.to_string());
        frame
    }

    pub fn demo_mode() -> Self {
        let mut frame = Self::bare(FrameKind::DemoMode);
        frame.is_demo = Some(true);
        frame
    }

    pub fn demo_content(text: impl Into<String>) -> Self {
        let mut frame = Self::bare(FrameKind::Content);
        frame.text = Some(text.into());
        frame.is_demo = Some(true);
        frame
    }

    pub fn demo_done() -> Self {
        let mut frame = Self::bare(FrameKind::Done);
        frame.is_demo = Some(true);
        frame
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut frame = Self::bare(FrameKind::Error);
        frame.error = Some(message.into());
        frame
    }
}

/// Serializes one frame onto the byte protocol.
pub fn encode_frame(frame: &Frame) -> Result<String, RelayError> {
    let json = serde_json::to_string(frame).map_err(|err| RelayError::encode(err.to_string()))?;
    Ok(format!("data: {json}\n\n"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub message: String,
}

impl RelayError {
    pub fn write(message: impl Into<String>) -> Self {
        Self {
            message: format!("frame write failed: {}", message.into()),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self {
            message: format!("frame encoding failed: {}", message.into()),
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for RelayError {}

/// Where outward frames go. A failed send means the client is gone; callers
/// must stop pulling from upstream once it errors.
pub trait FrameSink: Send {
    fn send<'a>(&'a mut self, frame: &'a Frame) -> BoxFuture<'a, Result<(), RelayError>>;
}

/// In-memory sink for tests and transcript capture.
#[derive(Debug, Default)]
pub struct VecFrameSink {
    frames: Vec<Frame>,
}

impl VecFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Concatenation of every content frame's text, in relay order.
    pub fn content_text(&self) -> String {
        self.frames
            .iter()
            .filter(|frame| frame.kind == FrameKind::Content)
            .filter_map(|frame| frame.text.as_deref())
            .collect()
    }
}

impl FrameSink for VecFrameSink {
    fn send<'a>(&'a mut self, frame: &'a Frame) -> BoxFuture<'a, Result<(), RelayError>> {
        Box::pin(async move {
            self.frames.push(frame.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_frame_encodes_the_live_client_shape() {
        let frame = Frame::content("Hello", ProviderId::Anthropic);
        let encoded = encode_frame(&frame).expect("encode");
        assert_eq!(
            encoded,
            "data: {\"type\":\"content\",\"text\":\"Hello\",\"provider\":\"anthropic\"}\n\n"
        );
    }

    #[test]
    fn demo_frames_carry_the_is_demo_flag_and_no_provider() {
        let lead = encode_frame(&Frame::demo_mode()).expect("encode");
        assert_eq!(lead, "data: {\"type\":\"demo_mode\",\"isDemo\":true}\n\n");

        let word = encode_frame(&Frame::demo_content("Welcome ")).expect("encode");
        assert_eq!(
            word,
            "data: {\"type\":\"content\",\"text\":\"Welcome \",\"isDemo\":true}\n\n"
        );

        let done = encode_frame(&Frame::demo_done()).expect("encode");
        assert_eq!(done, "data: {\"type\":\"done\",\"isDemo\":true}\n\n");
    }

    #[test]
    fn error_frame_carries_only_the_message() {
        let encoded = encode_frame(&Frame::error("Failed to generate response")).expect("encode");
        assert_eq!(
            encoded,
            "data: {\"type\":\"error\",\"error\":\"Failed to generate response\"}\n\n"
        );
    }

    #[tokio::test]
    async fn vec_frame_sink_accumulates_content_text_in_order() {
        let mut sink = VecFrameSink::new();
        sink.send(&Frame::content("Hel", ProviderId::OpenAi))
            .await
            .expect("send");
        sink.send(&Frame::content("lo", ProviderId::OpenAi))
            .await
            .expect("send");
        sink.send(&Frame::done(ProviderId::OpenAi))
            .await
            .expect("send");

        assert_eq!(sink.content_text(), "Hello");
        assert_eq!(sink.frames().len(), 3);
    }
}
