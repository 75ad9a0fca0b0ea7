//! Shared primitives for the Kintsugi gateway workspace crates.
//!
//! ```rust
//! use kcommon::{ChatTurn, Role, SessionCode, SessionContext, SessionMode};
//!
//! let turn = ChatTurn::new(Role::User, "I want to build a gym tracking app");
//! let context = SessionContext::new(SessionCode::from("KIN-4821"), SessionMode::General);
//!
//! assert_eq!(turn.role, Role::User);
//! assert_eq!(context.session_code.as_str(), "KIN-4821");
//! assert!(context.selected_subject.is_none());
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use kcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod session {
    //! Session identity and per-conversation context.
    //!
    //! ```rust
    //! use kcommon::{SessionCode, SessionContext, SessionMode, SubjectRecord};
    //!
    //! let subject = SubjectRecord::new("Bitcoin Writer", "bitcoin-writer")
    //!     .with_description("Collaborative document editing")
    //!     .with_status("Live");
    //!
    //! let context = SessionContext::new(SessionCode::from("KIN-1"), SessionMode::General)
    //!     .with_selected_subject(subject);
    //!
    //! assert_eq!(context.effective_mode(), SessionMode::Contribution);
    //! ```

    use std::fmt::{Display, Formatter};

    /// Short display code shown to the user and echoed in the welcome line.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct SessionCode(String);

    impl SessionCode {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionCode {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionCode {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionCode {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    /// Selects which system-prompt template governs the conversation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum SessionMode {
        General,
        Contribution,
        Client,
        Creative,
    }

    impl Display for SessionMode {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            let mode = match self {
                Self::General => "general",
                Self::Contribution => "contribution",
                Self::Client => "client",
                Self::Creative => "creative",
            };

            f.write_str(mode)
        }
    }

    /// Structured record describing the portfolio project a conversation is
    /// attached to.
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct SubjectRecord {
        pub title: String,
        pub slug: String,
        pub description: String,
        pub status: String,
        pub token_name: Option<String>,
        pub live_url: Option<String>,
    }

    impl SubjectRecord {
        pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
            Self {
                title: title.into(),
                slug: slug.into(),
                ..Self::default()
            }
        }

        pub fn with_description(mut self, description: impl Into<String>) -> Self {
            self.description = description.into();
            self
        }

        pub fn with_status(mut self, status: impl Into<String>) -> Self {
            self.status = status.into();
            self
        }

        pub fn with_token_name(mut self, token_name: impl Into<String>) -> Self {
            self.token_name = Some(token_name.into());
            self
        }

        pub fn with_live_url(mut self, live_url: impl Into<String>) -> Self {
            self.live_url = Some(live_url.into());
            self
        }
    }

    /// Read-only per-conversation context consumed by one gateway invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SessionContext {
        pub session_code: SessionCode,
        pub mode: SessionMode,
        pub selected_subject: Option<SubjectRecord>,
        pub category: Option<String>,
    }

    impl SessionContext {
        pub fn new(session_code: SessionCode, mode: SessionMode) -> Self {
            Self {
                session_code,
                mode,
                selected_subject: None,
                category: None,
            }
        }

        pub fn with_selected_subject(mut self, subject: SubjectRecord) -> Self {
            self.selected_subject = Some(subject);
            self
        }

        pub fn with_category(mut self, category: impl Into<String>) -> Self {
            self.category = Some(category.into());
            self
        }

        /// A general session with a selected subject runs under the
        /// contribution template.
        pub fn effective_mode(&self) -> SessionMode {
            if self.mode == SessionMode::General && self.selected_subject.is_some() {
                SessionMode::Contribution
            } else {
                self.mode
            }
        }
    }
}

pub mod chat {
    //! Conversation turn primitives.
    //!
    //! ```rust
    //! use kcommon::{ChatTurn, Role};
    //!
    //! let turns = vec![
    //!     ChatTurn::new(Role::User, "hello"),
    //!     ChatTurn::new(Role::Assistant, "hi there"),
    //! ];
    //! assert_eq!(turns[1].role, Role::Assistant);
    //! ```

    /// Who authored a turn. The gateway only ever sees user and assistant
    /// turns; the system prompt is assembled separately.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Role {
        User,
        Assistant,
    }

    /// One immutable entry of the conversation transcript. Ordering is the
    /// position in the containing slice.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ChatTurn {
        pub role: Role,
        pub text: String,
    }

    impl ChatTurn {
        pub fn new(role: Role, text: impl Into<String>) -> Self {
            Self {
                role,
                text: text.into(),
            }
        }

        pub fn user(text: impl Into<String>) -> Self {
            Self::new(Role::User, text)
        }

        pub fn assistant(text: impl Into<String>) -> Self {
            Self::new(Role::Assistant, text)
        }
    }
}

pub use chat::{ChatTurn, Role};
pub use future::BoxFuture;
pub use session::{SessionCode, SessionContext, SessionMode, SubjectRecord};
