//! Deterministic local fallback responder.
//!
//! When every upstream provider fails, the synthesizer classifies the
//! conversation with ordered keyword tables, picks a staged canned reply,
//! and types it out word by word so the client still sees a live stream.
//! Given the same `(turns, message, mode)` the emitted frames are identical
//! apart from the inter-word delay.

use std::time::Duration;

use kcommon::{ChatTurn, SessionContext, SessionMode};

use crate::relay::{Frame, FrameSink, RelayError};

/// Coarse conversation classification. First matching keyword wins, checked
/// in a fixed priority order over the lower-cased concatenated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoClassification {
    pub industry: Option<&'static str>,
    pub solution_type: &'static str,
    pub target: Option<&'static str>,
}

const INDUSTRY_KEYWORDS: [(&str, &[&str]); 7] = [
    (
        "Web3",
        &[
            "crypto",
            "token",
            "blockchain",
            "web3",
            "wallet",
            "decentralized",
            "nft",
            "defi",
        ],
    ),
    (
        "Fintech",
        &[
            "finance", "money", "bank", "payment", "invest", "trading", "fintech",
        ],
    ),
    (
        "HealthTech",
        &[
            "health", "doctor", "patient", "medical", "wellness", "fitness",
        ],
    ),
    (
        "EdTech",
        &[
            "learn",
            "teach",
            "school",
            "education",
            "course",
            "training",
            "student",
        ],
    ),
    (
        "E-commerce",
        &["shop", "store", "buy", "sell", "marketplace", "commerce"],
    ),
    (
        "Real Estate",
        &["estate", "property", "house", "rent", "landlord"],
    ),
    ("Gaming", &["game", "gaming", "esports", "player"]),
];

const SOLUTION_KEYWORDS: [(&str, &[&str]); 5] = [
    ("mobile app", &["app", "mobile", "ios", "android"]),
    ("platform", &["platform", "portal", "dashboard"]),
    ("marketplace", &["marketplace", "network"]),
    (
        "AI tool",
        &["ai", "bot", "automation", "intelligence", "gpt", "llm"],
    ),
    ("token project", &["token", "coin", "dao"]),
];

const TARGET_KEYWORDS: [(&str, &[&str]); 2] = [
    ("businesses", &["business", "company", "enterprise", "b2b"]),
    ("consumers", &["consumer", "people", "user", "b2c"]),
];

fn first_match(text: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(label, _)| *label)
}

/// Classifies the lower-cased concatenation of all turn text plus the
/// effective message. Pure and idempotent.
pub fn classify(turns: &[ChatTurn], effective_message: &str) -> DemoClassification {
    let full_conversation = turns
        .iter()
        .map(|turn| turn.text.as_str())
        .chain(std::iter::once(effective_message))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    DemoClassification {
        industry: first_match(&full_conversation, &INDUSTRY_KEYWORDS),
        solution_type: first_match(&full_conversation, &SOLUTION_KEYWORDS).unwrap_or("solution"),
        target: first_match(&full_conversation, &TARGET_KEYWORDS),
    }
}

fn general_stage_response(stage: usize, classification: DemoClassification) -> String {
    let industry_suffix = classification
        .industry
        .map(|industry| format!(" in {industry}"))
        .unwrap_or_default();
    let type_str = classification.solution_type;

    match stage {
        0 => "Welcome to Kintsugi. I'm here to help you figure out what you want to build and whether we can help. No sales pitch - just a conversation. What's the idea you're exploring?".to_string(),
        1 => {
            let industry_aside = classification
                .industry
                .map(|industry| format!(" - {industry} is a space with real problems to solve"))
                .unwrap_or_default();
            format!("Interesting{industry_aside}. Tell me more about why this matters to you. Is this something you've experienced personally, or an opportunity you've spotted?")
        }
        2 => "I'm getting a clearer picture. Who do you see as the first users? Not the whole market - just the first 10-20 people who would use this.".to_string(),
        3 => "Good. Now - what resources do you already have? Any technical skills, teammates, existing code, or capital you're working with? This helps me understand what kind of help would actually be useful.".to_string(),
        4 => "Makes sense. And honestly - what's your budget situation? Are you looking to bootstrap, invest some capital upfront, or explore equity-based arrangements? There's no wrong answer, it just shapes what we might build together.".to_string(),
        5 => "What timeline are you thinking? Some people want to move fast, others are exploring. And what's the smallest thing that would prove the idea works?".to_string(),
        6 => "I've got a good sense now. Before I suggest anything specific, let me ask: what would be MOST valuable to you right now? A quick prototype? Technical advice? Help with the token/fundraising side? Or something else entirely?".to_string(),
        7 => format!("## Let's Talk Specifics\n\nBased on our conversation, here's what I'm thinking:\n\n**What You Might Need**\nA focused {type_str}{industry_suffix} that proves the core concept.\n\n**How We Could Work Together**\nThis really depends on your budget and what you can contribute:\n\n- **If you can build it yourself**: We could advise and help with architecture (minimal cost or equity)\n- **If you need a prototype**: We could scope something small (price negotiable based on complexity)\n- **If you need ongoing development**: Monthly retainer or equity arrangement\n\nWhat feels right to you? Or should we discuss the specifics more?"),
        _ => "Let's figure out the right arrangement. What would work best for you:\n\n1. Pay-as-you-go for specific deliverables?\n2. A monthly retainer for ongoing work?\n3. Equity-based partnership?\n4. Some hybrid of these?\n\nTell me what you're comfortable with and we'll design something that works.".to_string(),
    }
}

const CLIENT_STAGE_RESPONSES: [&str; 6] = [
    "Welcome to b0ase! I'm here to help you understand what we can build together. Tell me more about your project - what problem are you trying to solve?",
    "That's a great idea! We've built similar solutions before. What's your timeline looking like? And do you have any existing designs, code, or branding we'd be working with?",
    "Got it. Based on what you've described, this sounds like a medium-sized project. We typically see similar builds in the £10,000 - £25,000 range, depending on final scope. What features are most critical for launch?",
    "Those priorities make sense. We'd recommend starting with an MVP focused on your core features, then iterating based on user feedback. Want to see some similar projects from our portfolio?",
    "I think we have a good understanding of your needs. The next step would be to fill out our formal project intake form - it helps us prepare an accurate proposal with detailed timeline and pricing. Ready to proceed?\n\nREADY_FOR_SIGNUP",
    "Perfect! Head over to our project intake form and we'll review your submission within 24 hours. Looking forward to potentially working together!\n\nREADY_FOR_SIGNUP",
];

fn aspect_label(broken_aspect: Option<&str>) -> String {
    let Some(aspect) = broken_aspect else {
        return "your business".to_string();
    };

    match aspect {
        "vision" => "vision and ideas".to_string(),
        "experience" => "customer experience".to_string(),
        "brand" => "brand identity".to_string(),
        "digital" => "digital presence".to_string(),
        "launch" => "launches and campaigns".to_string(),
        "relationships" => "customer relationships".to_string(),
        other => other.to_string(),
    }
}

fn creative_stage_response(stage: usize, broken_aspect: Option<&str>) -> String {
    let aspect = aspect_label(broken_aspect);

    match stage {
        0 => format!("Welcome to the Kintsugi Creative Engine. I see you're feeling the cracks in {aspect} - that sense that something isn't quite working the way it should. In Japanese pottery, those cracks become the most beautiful part once filled with gold. Let's find your gold.\n\nTell me more: when did you first notice this crack? What made you realize something was broken?"),
        1 => "That resonates deeply. Many businesses carry this same crack - it often starts small and spreads until it affects everything. The good news is that these fractures, once we understand them, often reveal the most meaningful opportunities for transformation.\n\nWhat have you tried so far to address this? Sometimes understanding past attempts helps us see the true shape of what needs repair.".to_string(),
        2 => "I'm starting to see the full picture of this crack. It's not just surface-level - it goes deeper into how your business connects with people. This is actually a positive sign: superficial problems are easy to paper over, but you're identifying something worth truly repairing.\n\nIf I could wave a wand and this was fixed tomorrow, what would be different? Paint me a picture of the \"repaired\" version.".to_string(),
        3 => "That vision of the repaired version - that's your gold. Now I can see which service will help you get there. Based on what you've shared, I'd recommend starting with a **Blue Sky Session** - a 2-hour deep dive where we explore the wildest possibilities, then ground them in what's actually achievable.\n\nWould you like to explore what that session would look like?".to_string(),
        4 => "I think we've found the gold for your repair. The creative services at b0ase.com can transform this crack into a feature - something that makes your brand more interesting, more human, more memorable.\n\nReady to explore our creative services and see which ones fit your repair?\n\nSHOW_SERVICES".to_string(),
        _ => "Your crack is clear, your gold is identified, and the path to repair is mapped out. The next step is simple: book a session and let's start the transformation.\n\nSHOW_SERVICES".to_string(),
    }
}

/// The full reply text for one synthesized turn. Exposed separately from
/// emission so exact-match tests need no stream plumbing.
pub fn stage_response(
    turns: &[ChatTurn],
    effective_message: &str,
    context: &SessionContext,
) -> String {
    match context.effective_mode() {
        SessionMode::General | SessionMode::Contribution => {
            let stage = turns.len().min(7);
            general_stage_response(stage, classify(turns, effective_message))
        }
        SessionMode::Client => CLIENT_STAGE_RESPONSES[turns.len().min(5)].to_string(),
        SessionMode::Creative => {
            creative_stage_response(turns.len().min(5), context.category.as_deref())
        }
    }
}

pub struct DemoSynthesizer {
    word_delay: Option<Duration>,
}

impl DemoSynthesizer {
    pub fn new() -> Self {
        Self { word_delay: None }
    }

    /// Overrides the per-mode typing delay. Tests pass `Duration::ZERO`.
    pub fn with_word_delay(mut self, delay: Duration) -> Self {
        self.word_delay = Some(delay);
        self
    }

    fn delay_for(&self, mode: SessionMode) -> Duration {
        self.word_delay.unwrap_or(match mode {
            SessionMode::Creative => Duration::from_millis(30),
            _ => Duration::from_millis(25),
        })
    }

    /// Emits the synthetic reply: a leading `demo_mode` frame, one content
    /// frame per word (each word plus a trailing space), then `done`.
    /// Returns the full reply text for directive scanning. The only failure
    /// mode is the sink itself.
    pub async fn synthesize(
        &self,
        turns: &[ChatTurn],
        effective_message: &str,
        context: &SessionContext,
        sink: &mut dyn FrameSink,
    ) -> Result<String, RelayError> {
        let response = stage_response(turns, effective_message, context);
        let delay = self.delay_for(context.effective_mode());

        tracing::info!(
            phase = "demo",
            event = "synthesize",
            mode = %context.effective_mode(),
            stage = turns.len(),
            "all providers exhausted; synthesizing reply"
        );

        sink.send(&Frame::demo_mode()).await?;

        for word in response.split(' ') {
            sink.send(&Frame::demo_content(format!("{word} "))).await?;
            if !delay.is_zero() {
                futures_timer::Delay::new(delay).await;
            }
        }

        sink.send(&Frame::demo_done()).await?;
        Ok(response)
    }
}

impl Default for DemoSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
