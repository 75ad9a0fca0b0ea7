//! Control directives embedded in assistant prose.
//!
//! Directives travel in-band as whole lines inside the accumulated content
//! text; consumers must scan the running concatenation of all content
//! frames, never individual frames, because a tag can span frame
//! boundaries. Matched lines are stripped for display but stay in the
//! model's own context on later turns.
//!
//! ```rust
//! use kgateway::directives::{scan, strip, ControlDirective};
//!
//! let text = "Great. Project renamed to Foo.\nPROJECT_NAME: Foo\n";
//! assert_eq!(scan(text), vec![ControlDirective::ProjectName("Foo".to_string())]);
//! assert_eq!(strip(text), "Great. Project renamed to Foo.\n");
//! ```

use kcommon::BoxFuture;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlDirective {
    ProjectName(String),
    CreateRepo,
    InscribeChat,
    AcceptProposal(serde_json::Value),
    ReadyForSignup,
    ShowServices,
}

fn parse_line(line: &str) -> Option<ControlDirective> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("PROJECT_NAME:") {
        let name = rest.trim();
        if name.is_empty() {
            return None;
        }
        return Some(ControlDirective::ProjectName(name.to_string()));
    }

    if let Some(rest) = line.strip_prefix("ACCEPT_PROPOSAL:") {
        // A malformed payload is not a directive; the raw line stays visible
        // so the collision is noticeable instead of silently dropped.
        let payload: serde_json::Value = serde_json::from_str(rest.trim()).ok()?;
        return Some(ControlDirective::AcceptProposal(payload));
    }

    match line {
        "CREATE_REPO" => Some(ControlDirective::CreateRepo),
        "INSCRIBE_CHAT" => Some(ControlDirective::InscribeChat),
        "READY_FOR_SIGNUP" => Some(ControlDirective::ReadyForSignup),
        "SHOW_SERVICES" => Some(ControlDirective::ShowServices),
        _ => None,
    }
}

/// Collects every directive line in the accumulated text, in order.
pub fn scan(text: &str) -> Vec<ControlDirective> {
    text.lines().filter_map(parse_line).collect()
}

/// Removes matched directive lines, leaving everything else untouched.
pub fn strip(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if parse_line(line).is_some() {
            continue;
        }
        out.push_str(line);
    }
    out
}

/// Receives accepted proposals extracted from assistant output. The
/// gateway's job ends at emitting the event; persistence lives behind this
/// seam.
pub trait ProposalSink: Send + Sync {
    fn proposal_accepted<'a>(&'a self, payload: &'a serde_json::Value) -> BoxFuture<'a, ()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProposalSink;

impl ProposalSink for NoopProposalSink {
    fn proposal_accepted<'a>(&'a self, _payload: &'a serde_json::Value) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_round_trips_through_scan_and_strip() {
        let text = "PROJECT_NAME: Foo\nand here is the rest of the reply";

        let directives = scan(text);
        assert_eq!(
            directives,
            vec![ControlDirective::ProjectName("Foo".to_string())]
        );

        assert_eq!(strip(text), "and here is the rest of the reply");
    }

    #[test]
    fn bare_tags_match_only_as_whole_lines() {
        let text = "Initializing your repository...\nCREATE_REPO\nsee CREATE_REPO above";

        assert_eq!(scan(text), vec![ControlDirective::CreateRepo]);
        assert_eq!(
            strip(text),
            "Initializing your repository...\nsee CREATE_REPO above"
        );
    }

    #[test]
    fn accept_proposal_parses_its_json_payload() {
        let text = r#"ACCEPT_PROPOSAL: {"type": "new_project", "title": "GymTrack"}"#;

        let directives = scan(text);
        assert_eq!(directives.len(), 1);
        let ControlDirective::AcceptProposal(payload) = &directives[0] else {
            panic!("expected an accepted proposal");
        };
        assert_eq!(payload["title"], "GymTrack");

        assert_eq!(strip(text), "");
    }

    #[test]
    fn malformed_proposal_payload_is_left_in_place() {
        let text = "ACCEPT_PROPOSAL: not json\n";
        assert!(scan(text).is_empty());
        assert_eq!(strip(text), text);
    }

    #[test]
    fn signup_and_services_tags_scan_in_document_order() {
        let text = "Ready to proceed?\n\nREADY_FOR_SIGNUP\nSHOW_SERVICES\n";
        assert_eq!(
            scan(text),
            vec![
                ControlDirective::ReadyForSignup,
                ControlDirective::ShowServices,
            ]
        );
        assert_eq!(strip(text), "Ready to proceed?\n\n");
    }

    #[test]
    fn indented_directive_lines_still_match() {
        let text = "  INSCRIBE_CHAT  \n";
        assert_eq!(scan(text), vec![ControlDirective::InscribeChat]);
        assert_eq!(strip(text), "");
    }
}
