//! In-memory session state: bounded history plus the clarification slot.
//!
//! The registry is the authoritative in-process copy; the durable record
//! lives with the persistence collaborator. Sessions are created lazily on
//! first use and live for the process lifetime.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::ids::SessionId;
use super::problem::ResolvedProblem;
use super::turn::{Role, Turn};

/// Default number of turns retained in memory per session.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Default window of recent turns handed to the model as context.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// What the orchestrator is waiting on mid-clarification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwaitedInput {
    /// The programming language the answer should be written in.
    TargetLanguage,
}

impl AwaitedInput {
    /// The clarifying question to (re-)emit while this input is pending.
    pub fn question(&self) -> &'static str {
        match self {
            AwaitedInput::TargetLanguage => {
                "Which programming language would you like the solution in \
                 (e.g. Python, Java, C++)?"
            }
        }
    }
}

/// Context carried across turns while a clarification is pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationContext {
    /// What is being awaited.
    pub awaiting: AwaitedInput,
    /// The resolved problem to answer once the clarification arrives.
    pub problem: ResolvedProblem,
    /// Whether the original request also asked for a visualization artifact.
    pub wants_artifact: bool,
}

/// The per-session state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Ready for any input.
    Idle,
    /// A clarifying question is outstanding.
    AwaitingClarification,
}

/// One session's conversation state.
///
/// Mode and clarification slot are kept as separate fields so a session
/// rehydrated from partial persisted state degrades detectably instead of
/// silently: `AwaitingClarification` with an empty slot is the corrupted
/// combination the orchestrator recovers from.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    history: VecDeque<Turn>,
    max_history: usize,
    mode: SessionMode,
    clarification: Option<ClarificationContext>,
}

impl Session {
    fn new(id: SessionId, max_history: usize) -> Self {
        Self {
            id,
            history: VecDeque::new(),
            max_history,
            mode: SessionMode::Idle,
            clarification: None,
        }
    }

    /// This session's id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state machine position.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Forces the state machine position to fabricate inconsistent states;
    /// normal transitions go through
    /// [`begin_clarification`](Self::begin_clarification) and
    /// [`take_clarification`](Self::take_clarification).
    #[cfg(test)]
    pub(crate) fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
    }

    /// Appends a turn, evicting the oldest once the bound is exceeded.
    pub fn push_turn(&mut self, role: Role, content: impl Into<String>) {
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(Turn::new(role, content));
    }

    /// Returns at most `window` most recent turns, oldest first.
    pub fn recent_history(&self, window: usize) -> Vec<Turn> {
        let skip = self.history.len().saturating_sub(window);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Total turns currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Enters `AwaitingClarification`, storing the context to resume with.
    pub fn begin_clarification(&mut self, context: ClarificationContext) {
        self.clarification = Some(context);
        self.mode = SessionMode::AwaitingClarification;
    }

    /// Peeks at the pending clarification, if any.
    pub fn clarification(&self) -> Option<&ClarificationContext> {
        self.clarification.as_ref()
    }

    /// Takes the pending clarification and returns the session to `Idle`.
    ///
    /// Always resets the mode, even when the slot turns out to be empty,
    /// so no exit path can leave the session wedged.
    pub fn take_clarification(&mut self) -> Option<ClarificationContext> {
        self.mode = SessionMode::Idle;
        self.clarification.take()
    }
}

/// Registry of live sessions, keyed by id.
///
/// `get_or_create` is idempotent; each session carries its own async mutex so
/// turns for one session serialize while distinct sessions run in parallel.
pub struct SessionRegistry {
    max_history: usize,
    sessions: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionRegistry {
    /// Creates a registry with the given per-session history bound.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `id`, creating it on first reference.
    pub fn get_or_create(&self, id: SessionId) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        sessions
            .entry(id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new(id, self.max_history))))
            .clone()
    }

    /// Number of sessions currently live.
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session registry poisoned").len()
    }

    /// True when no session has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
