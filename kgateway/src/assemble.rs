//! System-prompt assembly and user-message rewriting.
//!
//! Enrichment is strictly best effort: every collaborator call runs under a
//! timeout and any failure degrades to "no enrichment" with a warning. The
//! hidden `[SYSTEM NOTE: ...]` blocks are visible to the model but must
//! never be echoed verbatim to the user; that contract is enforced by the
//! prompt itself, not by post-filtering.

use std::sync::Arc;
use std::time::Duration;

use kcommon::{BoxFuture, ChatTurn, Role, SessionContext, SessionMode, SubjectRecord};

use crate::GatewayError;
use crate::prompts;

pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ISSUES: usize = 10;
const ISSUE_BODY_PREVIEW: usize = 200;

const NAME_PROMPT_MARKER: &str = "give your project a name";

/// Repository coordinates resolved from a portfolio project slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
}

/// One open issue record spliced into the contribution prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub labels: Vec<String>,
    pub body: Option<String>,
    pub url: String,
}

/// Portfolio lookup: maps a project slug to its repository, when one is
/// linked.
pub trait ProjectDirectory: Send + Sync {
    fn locate<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Option<RepoLocator>, GatewayError>>;
}

/// Issue-tracker reader for a located repository.
pub trait IssueReader: Send + Sync {
    fn open_issues<'a>(
        &'a self,
        locator: &'a RepoLocator,
    ) -> BoxFuture<'a, Result<Vec<IssueRecord>, GatewayError>>;
}

/// Collision check for candidate project names.
pub trait NameRegistry: Send + Sync {
    fn title_exists<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<bool, GatewayError>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProjectDirectory;

impl ProjectDirectory for NoopProjectDirectory {
    fn locate<'a>(&'a self, _slug: &'a str) -> BoxFuture<'a, Result<Option<RepoLocator>, GatewayError>> {
        Box::pin(async { Ok(None) })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIssueReader;

impl IssueReader for NoopIssueReader {
    fn open_issues<'a>(
        &'a self,
        _locator: &'a RepoLocator,
    ) -> BoxFuture<'a, Result<Vec<IssueRecord>, GatewayError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNameRegistry;

impl NameRegistry for NoopNameRegistry {
    fn title_exists<'a>(&'a self, _title: &'a str) -> BoxFuture<'a, Result<bool, GatewayError>> {
        Box::pin(async { Ok(false) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system_prompt: String,
    pub effective_user_message: String,
}

pub struct PromptAssembler {
    directory: Arc<dyn ProjectDirectory>,
    issues: Arc<dyn IssueReader>,
    names: Arc<dyn NameRegistry>,
    enrichment_timeout: Duration,
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self {
            directory: Arc::new(NoopProjectDirectory),
            issues: Arc::new(NoopIssueReader),
            names: Arc::new(NoopNameRegistry),
            enrichment_timeout: ENRICHMENT_TIMEOUT,
        }
    }

    pub fn with_project_directory(mut self, directory: Arc<dyn ProjectDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_issue_reader(mut self, issues: Arc<dyn IssueReader>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_name_registry(mut self, names: Arc<dyn NameRegistry>) -> Self {
        self.names = names;
        self
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    /// Builds the system prompt for the session and rewrites the raw user
    /// message when a special session state applies.
    pub async fn assemble(
        &self,
        turns: &[ChatTurn],
        context: &SessionContext,
        raw_user_message: &str,
    ) -> AssembledPrompt {
        let mode = context.effective_mode();
        let mut system_prompt = prompts::base_template(mode).to_string();

        if mode == SessionMode::Contribution
            && let Some(subject) = &context.selected_subject
        {
            let issues_context = self.issues_context(subject).await;
            system_prompt.push_str(&project_context(subject, &issues_context));
        }

        let effective_user_message = self
            .rewrite_message(turns, context, mode, raw_user_message)
            .await;

        AssembledPrompt {
            system_prompt,
            effective_user_message,
        }
    }

    async fn issues_context(&self, subject: &SubjectRecord) -> String {
        let locate = tokio::time::timeout(
            self.enrichment_timeout,
            self.directory.locate(&subject.slug),
        );
        let locator = match locate.await {
            Ok(Ok(Some(locator))) => locator,
            Ok(Ok(None)) => return String::new(),
            Ok(Err(err)) => {
                tracing::warn!(
                    phase = "assemble",
                    event = "project_lookup_failed",
                    slug = %subject.slug,
                    error = %err
                );
                return String::new();
            }
            Err(_) => {
                tracing::warn!(
                    phase = "assemble",
                    event = "project_lookup_timeout",
                    slug = %subject.slug
                );
                return String::new();
            }
        };

        let issues = tokio::time::timeout(self.enrichment_timeout, self.issues.open_issues(&locator));
        let issues = match issues.await {
            Ok(Ok(issues)) => issues,
            Ok(Err(err)) => {
                tracing::warn!(
                    phase = "assemble",
                    event = "issue_fetch_failed",
                    slug = %subject.slug,
                    error = %err
                );
                return String::new();
            }
            Err(_) => {
                tracing::warn!(
                    phase = "assemble",
                    event = "issue_fetch_timeout",
                    slug = %subject.slug
                );
                return String::new();
            }
        };

        if issues.is_empty() {
            return String::new();
        }

        let total = issues.len();
        let mut section = format!(
            "\n\n## Open GitHub Issues ({total} total)\n\nThese are REAL issues from the repo that need work:\n\n"
        );

        for (index, issue) in issues.iter().take(MAX_ISSUES).enumerate() {
            section.push_str(&format!(
                "{}. **#{}: {}**\n",
                index + 1,
                issue.number,
                issue.title
            ));
            if !issue.labels.is_empty() {
                section.push_str(&format!("   Labels: {}\n", issue.labels.join(", ")));
            }
            if let Some(body) = &issue.body {
                let preview: String = body.chars().take(ISSUE_BODY_PREVIEW).collect();
                let ellipsis = if body.chars().count() > ISSUE_BODY_PREVIEW {
                    "..."
                } else {
                    ""
                };
                section.push_str(&format!("   {preview}{ellipsis}\n"));
            }
            section.push_str(&format!("   URL: {}\n\n", issue.url));
        }

        section.push_str("When someone wants to help, reference these REAL issues. Don't make up work.");
        section
    }

    async fn rewrite_message(
        &self,
        turns: &[ChatTurn],
        context: &SessionContext,
        mode: SessionMode,
        raw: &str,
    ) -> String {
        if turns.is_empty() {
            return first_turn_note(context, mode, raw);
        }

        let Some(previous) = turns.last() else {
            return raw.to_string();
        };
        if previous.role != Role::Assistant
            || !previous.text.to_lowercase().contains(NAME_PROMPT_MARKER)
        {
            return raw.to_string();
        }

        let Some(candidate) = extract_candidate_name(raw) else {
            return raw.to_string();
        };

        let lookup = tokio::time::timeout(self.enrichment_timeout, self.names.title_exists(&candidate));
        match lookup.await {
            Ok(Ok(true)) => format!(
                "[SYSTEM NOTE: The user wants to name the project \"{candidate}\" but this name is ALREADY TAKEN in the database. Please inform them of this collision and ask for a unique name.]\n\n{raw}"
            ),
            Ok(Ok(false)) => raw.to_string(),
            Ok(Err(err)) => {
                tracing::warn!(
                    phase = "assemble",
                    event = "name_check_failed",
                    error = %err
                );
                raw.to_string()
            }
            Err(_) => {
                tracing::warn!(phase = "assemble", event = "name_check_timeout");
                raw.to_string()
            }
        }
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn project_context(subject: &SubjectRecord, issues_context: &str) -> String {
    format!(
        "\n## Selected Project: {title}\n\n**Description:** {description}\n**Status:** {status}\n**Token:** {token}\n**Live URL:** {url}\n{issues_context}\n\nThe user is interested in contributing to this specific project. Ask them what they want to do:\n- Pick one of the GitHub issues above to work on?\n- Propose a new feature?\n- Invest in development of specific issues?\n- Just provide feedback?\n\nIMPORTANT: When discussing work, reference the REAL GitHub issues listed above. Don't invent fictional tasks.",
        title = subject.title,
        description = subject.description,
        status = subject.status,
        token = subject.token_name.as_deref().unwrap_or("Not yet assigned"),
        url = subject.live_url.as_deref().unwrap_or("Not yet deployed"),
    )
}

fn first_turn_note(context: &SessionContext, mode: SessionMode, raw: &str) -> String {
    let code = if context.session_code.as_str().is_empty() {
        "unknown"
    } else {
        context.session_code.as_str()
    };

    match mode {
        SessionMode::General | SessionMode::Contribution => format!(
            "[SYSTEM NOTE: This is the start of a new session. Please start your response with a welcome message: \"Welcome to Kintsugi. I am an AI Agent designed to build your entire app from concept to code.\" and mention that their current Session ID is {code}. Then ask \"Would you like to give your project a name? (Y/N)\". After they respond, we can move into the Discovery phase. Now, here is the user's first message: ]\n\n{raw}"
        ),
        SessionMode::Client => {
            let category_context = context
                .category
                .as_deref()
                .map(|category| format!(" They're interested in: {category}."))
                .unwrap_or_default();
            format!(
                "[SYSTEM NOTE: This is the start of a client inquiry session (ID: {code}).{category_context} Welcome them warmly, acknowledge what they're interested in building, and ask a clarifying question to understand their needs better.]\n\n{raw}"
            )
        }
        SessionMode::Creative => {
            let aspect_context = context
                .category
                .as_deref()
                .map(|aspect| format!(" They've identified that their \"{aspect}\" needs repairing."))
                .unwrap_or_default();
            format!(
                "[SYSTEM NOTE: This is the start of a creative Kintsugi session (ID: {code}).{aspect_context} Welcome them with empathy, acknowledge what they're struggling with using the Kintsugi metaphor, and ask a clarifying question to understand the full picture of what's \"broken.\"]\n\n{raw}"
            )
        }
    }
}

/// Extracts a candidate project name from a naming reply: strips leading
/// "yes, let's call it" boilerplate and trailing quote/period, then applies
/// the length and bare-yes/no filters. Returns `None` when the message does
/// not look like a name at all.
pub fn extract_candidate_name(message: &str) -> Option<String> {
    let mut candidate = message.trim().to_string();

    let lowered = candidate.to_lowercase();
    for prefix in ["yes, let's call it '", "yes, let's call it \"", "yes, let's call it "] {
        if lowered.starts_with(prefix) {
            candidate = candidate[prefix.len()..].to_string();
            break;
        }
    }

    if candidate.ends_with('.') {
        candidate.pop();
    }
    if candidate.ends_with('\'') || candidate.ends_with('"') {
        candidate.pop();
    }

    let lowered = candidate.to_lowercase();
    if let Some(rest) = lowered.strip_prefix("yes, ") {
        candidate = candidate[candidate.len() - rest.len()..].to_string();
    } else if let Some(rest) = lowered.strip_prefix("yes ") {
        candidate = candidate[candidate.len() - rest.len()..].to_string();
    }

    let lowered = candidate.to_lowercase();
    if candidate.len() > 2
        && candidate.len() < 50
        && !matches!(lowered.as_str(), "yes" | "no" | "y" | "n")
    {
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use kcommon::SessionCode;

    use super::*;

    fn context(mode: SessionMode) -> SessionContext {
        SessionContext::new(SessionCode::from("KIN-4821"), mode)
    }

    struct CollidingRegistry;

    impl NameRegistry for CollidingRegistry {
        fn title_exists<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<bool, GatewayError>> {
            let taken = title.eq_ignore_ascii_case("Silver Surfer");
            Box::pin(async move { Ok(taken) })
        }
    }

    struct FailingRegistry;

    impl NameRegistry for FailingRegistry {
        fn title_exists<'a>(&'a self, _title: &'a str) -> BoxFuture<'a, Result<bool, GatewayError>> {
            Box::pin(async { Err(GatewayError::internal("registry offline")) })
        }
    }

    #[test]
    fn candidate_name_extraction_strips_boilerplate() {
        assert_eq!(
            extract_candidate_name("yes, let's call it 'GymTrack'."),
            Some("GymTrack".to_string())
        );
        assert_eq!(
            extract_candidate_name("Yes, Silver Surfer"),
            Some("Silver Surfer".to_string())
        );
        assert_eq!(
            extract_candidate_name("InvoiceFlow."),
            Some("InvoiceFlow".to_string())
        );
        assert_eq!(extract_candidate_name("yes"), None);
        assert_eq!(extract_candidate_name("N"), None);
        assert_eq!(extract_candidate_name("ab"), None);
        assert_eq!(extract_candidate_name(&"x".repeat(50)), None);
    }

    #[tokio::test]
    async fn first_turn_gets_the_welcome_instruction_block() {
        let assembler = PromptAssembler::new();
        let assembled = assembler
            .assemble(&[], &context(SessionMode::General), "I want to build a gym tracking app")
            .await;

        assert!(assembled
            .effective_user_message
            .starts_with("[SYSTEM NOTE: This is the start of a new session."));
        assert!(assembled.effective_user_message.contains("Session ID is KIN-4821"));
        assert!(assembled
            .effective_user_message
            .ends_with("I want to build a gym tracking app"));
        assert_eq!(assembled.system_prompt, prompts::KINTSUGI_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn creative_first_turn_names_the_broken_aspect() {
        let assembler = PromptAssembler::new();
        let creative = context(SessionMode::Creative).with_category("brand");
        let assembled = assembler.assemble(&[], &creative, "help").await;

        assert!(assembled
            .effective_user_message
            .contains("They've identified that their \"brand\" needs repairing."));
    }

    #[tokio::test]
    async fn name_collision_prepends_already_taken_note_with_original_message() {
        let assembler =
            PromptAssembler::new().with_name_registry(Arc::new(CollidingRegistry));
        let turns = vec![
            ChatTurn::user("Yes"),
            ChatTurn::assistant("Great! Would you like to give your project a name?"),
        ];

        let assembled = assembler
            .assemble(&turns, &context(SessionMode::General), "Silver Surfer")
            .await;

        assert!(assembled.effective_user_message.contains("ALREADY TAKEN"));
        assert!(assembled.effective_user_message.ends_with("\n\nSilver Surfer"));
    }

    #[tokio::test]
    async fn unique_names_and_registry_failures_leave_the_message_untouched() {
        let turns = vec![
            ChatTurn::user("Yes"),
            ChatTurn::assistant("Would you like to give your project a name? (Y/N)"),
        ];

        let unique = PromptAssembler::new()
            .with_name_registry(Arc::new(CollidingRegistry))
            .assemble(&turns, &context(SessionMode::General), "GymTrack")
            .await;
        assert_eq!(unique.effective_user_message, "GymTrack");

        let failed = PromptAssembler::new()
            .with_name_registry(Arc::new(FailingRegistry))
            .assemble(&turns, &context(SessionMode::General), "Silver Surfer")
            .await;
        assert_eq!(failed.effective_user_message, "Silver Surfer");
    }

    #[tokio::test]
    async fn name_check_skips_when_previous_turn_is_not_the_naming_prompt() {
        let assembler =
            PromptAssembler::new().with_name_registry(Arc::new(CollidingRegistry));
        let turns = vec![
            ChatTurn::user("hello"),
            ChatTurn::assistant("Tell me about your idea."),
        ];

        let assembled = assembler
            .assemble(&turns, &context(SessionMode::General), "Silver Surfer")
            .await;
        assert_eq!(assembled.effective_user_message, "Silver Surfer");
    }

    #[tokio::test]
    async fn selected_subject_appends_project_and_issue_context() {
        struct OneRepo;
        impl ProjectDirectory for OneRepo {
            fn locate<'a>(
                &'a self,
                slug: &'a str,
            ) -> BoxFuture<'a, Result<Option<RepoLocator>, GatewayError>> {
                let found = slug == "bitcoin-writer";
                Box::pin(async move {
                    Ok(found.then(|| RepoLocator {
                        owner: "b0ase".to_string(),
                        repo: "bitcoin-writer".to_string(),
                    }))
                })
            }
        }

        struct TwoIssues;
        impl IssueReader for TwoIssues {
            fn open_issues<'a>(
                &'a self,
                _locator: &'a RepoLocator,
            ) -> BoxFuture<'a, Result<Vec<IssueRecord>, GatewayError>> {
                Box::pin(async {
                    Ok(vec![
                        IssueRecord {
                            number: 12,
                            title: "Fix autosave".to_string(),
                            labels: vec!["bug".to_string()],
                            body: Some("Autosave drops edits".to_string()),
                            url: "https://github.com/b0ase/bitcoin-writer/issues/12".to_string(),
                        },
                        IssueRecord {
                            number: 15,
                            title: "Dark mode".to_string(),
                            labels: Vec::new(),
                            body: None,
                            url: "https://github.com/b0ase/bitcoin-writer/issues/15".to_string(),
                        },
                    ])
                })
            }
        }

        let assembler = PromptAssembler::new()
            .with_project_directory(Arc::new(OneRepo))
            .with_issue_reader(Arc::new(TwoIssues));

        let subject = SubjectRecord::new("Bitcoin Writer", "bitcoin-writer")
            .with_description("Collaborative document editing")
            .with_status("Live")
            .with_token_name("$WRITER");
        let ctx = context(SessionMode::General).with_selected_subject(subject);

        let assembled = assembler.assemble(&[], &ctx, "I want to help").await;

        assert!(assembled.system_prompt.starts_with(prompts::CONTRIBUTION_SYSTEM_PROMPT));
        assert!(assembled.system_prompt.contains("## Selected Project: Bitcoin Writer"));
        assert!(assembled.system_prompt.contains("**Token:** $WRITER"));
        assert!(assembled.system_prompt.contains("**Live URL:** Not yet deployed"));
        assert!(assembled.system_prompt.contains("## Open GitHub Issues (2 total)"));
        assert!(assembled.system_prompt.contains("1. **#12: Fix autosave**"));
        assert!(assembled.system_prompt.contains("   Labels: bug"));
    }

    #[tokio::test]
    async fn enrichment_failure_degrades_to_no_enrichment() {
        struct BrokenDirectory;
        impl ProjectDirectory for BrokenDirectory {
            fn locate<'a>(
                &'a self,
                _slug: &'a str,
            ) -> BoxFuture<'a, Result<Option<RepoLocator>, GatewayError>> {
                Box::pin(async { Err(GatewayError::internal("directory offline")) })
            }
        }

        let assembler =
            PromptAssembler::new().with_project_directory(Arc::new(BrokenDirectory));
        let subject = SubjectRecord::new("Miss Void", "miss-void").with_status("Live");
        let ctx = context(SessionMode::General).with_selected_subject(subject);

        let assembled = assembler.assemble(&[], &ctx, "I want to help").await;
        assert!(assembled.system_prompt.contains("## Selected Project: Miss Void"));
        assert!(!assembled.system_prompt.contains("## Open GitHub Issues"));
    }
}
