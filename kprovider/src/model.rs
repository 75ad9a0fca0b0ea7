//! Provider identity and the provider-agnostic prompt shape.
//!
//! ```rust
//! use kcommon::ChatTurn;
//! use kprovider::{ChatPrompt, ProviderErrorKind, ProviderId};
//!
//! let ok = ChatPrompt::new_validated(
//!     "You are the Kintsugi Engine.",
//!     vec![ChatTurn::user("hello")],
//!     "I want to build a gym tracking app",
//! );
//! assert!(ok.is_ok());
//!
//! let err = ChatPrompt::new_validated("system", Vec::new(), "   ")
//!     .err()
//!     .expect("blank message should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! assert_eq!(ProviderId::Anthropic.to_string(), "anthropic");
//! ```

use std::fmt::{Display, Formatter};

use kcommon::ChatTurn;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Anthropic,
    Kimi,
    Gemini,
    Deepseek,
    OpenAi,
}

impl ProviderId {
    /// Parses the provider tag carried by the preference header or cookie.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Some(Self::Anthropic),
            "kimi" => Some(Self::Kimi),
            "gemini" => Some(Self::Gemini),
            "deepseek" => Some(Self::Deepseek),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Anthropic => "anthropic",
            Self::Kimi => "kimi",
            Self::Gemini => "gemini",
            Self::Deepseek => "deepseek",
            Self::OpenAi => "openai",
        };

        f.write_str(id)
    }
}

/// Snapshot of everything one adapter attempt needs: the assembled system
/// prompt, prior turns in order, and the (possibly rewritten) user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system_prompt: String,
    pub turns: Vec<ChatTurn>,
    pub user_message: String,
}

impl ChatPrompt {
    pub fn new(
        system_prompt: impl Into<String>,
        turns: Vec<ChatTurn>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            turns,
            user_message: user_message.into(),
        }
    }

    pub fn new_validated(
        system_prompt: impl Into<String>,
        turns: Vec<ChatTurn>,
        user_message: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let prompt = Self::new(system_prompt, turns, user_message);
        prompt.validate()?;
        Ok(prompt)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.user_message.trim().is_empty() {
            return Err(ProviderError::invalid_request(
                "user message must not be empty",
            ));
        }

        Ok(())
    }
}
