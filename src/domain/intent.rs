//! Intent classification for incoming user text.
//!
//! Pure and deterministic: lower-cases the input and scans ordered keyword
//! sets, returning the first matching intent in fixed priority order.
//! Runs before any network call, so the orchestrator can decide cheaply
//! whether a turn needs a visualization, tutoring context, or plain chat.

use serde::{Deserialize, Serialize};

/// Coarse intent derived from one user turn.
///
/// Not part of session state; only attached to the persisted turn record
/// for later analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// User asked for a step-by-step visualization payload.
    Visualization,
    /// Computer-science tutoring question.
    Tutor,
    /// Definition / knowledge-base lookup.
    KnowledgeLookup,
    /// Anything else.
    General,
}

impl Intent {
    /// Stable string form used in persisted rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Visualization => "visualization",
            Intent::Tutor => "cs_tutor",
            Intent::KnowledgeLookup => "knowledge_lookup",
            Intent::General => "general",
        }
    }
}

/// Keywords that signal a visualization request. Checked first.
const VISUALIZATION_KEYWORDS: &[&str] = &[
    "visualize",
    "visualise",
    "dry run",
    "step by step",
    "show steps",
    "walkthrough",
    "animate",
];

/// Keywords that signal a CS tutoring question.
const TUTOR_KEYWORDS: &[&str] = &[
    "computer science",
    "data structure",
    "algorithm",
    "complexity",
    "big o",
    "how to",
    "example",
];

/// Keywords that signal a knowledge-base lookup.
const KNOWLEDGE_KEYWORDS: &[&str] = &["what is", "what are", "define", "information about"];

/// Classifies one turn of user text.
///
/// Priority: visualization > tutor > knowledge lookup > general.
/// Empty or whitespace-only input classifies as [`Intent::General`].
pub fn classify(input: &str) -> Intent {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return Intent::General;
    }

    if VISUALIZATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Intent::Visualization
    } else if TUTOR_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Intent::Tutor
    } else if KNOWLEDGE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Intent::KnowledgeLookup
    } else {
        Intent::General
    }
}
