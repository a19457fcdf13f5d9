//! Conversation orchestrator - the per-session turn state machine.
//!
//! Consumes one user turn and emits an ordered sequence of output events
//! (text fragments, at most one artifact, terminal errors) through a channel
//! the transport layer forwards as SSE frames. A session is either `Idle` or
//! `AwaitingClarification`; every exit path restores `Idle` except the one
//! that legitimately re-enters the clarification wait.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::ProblemResolver;
use crate::domain::resolve::looks_like_reference;
use crate::domain::session::DEFAULT_HISTORY_WINDOW;
use crate::domain::{
    artifact, intent, knowledge, AwaitedInput, ClarificationContext, Intent, OutputEvent, Role,
    Session, SessionId, SessionMode, SessionRegistry,
};
use crate::ports::{AiProvider, ChatStore, CompletionRequest, MessageRole, TurnRecord};
use crate::prompts;

/// Tuning knobs for the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// How many recent turns are handed to the model as context.
    pub history_window: usize,
    /// Capacity of the per-turn event channel.
    pub channel_capacity: usize,
    /// Temperature for chat completions.
    pub temperature: f32,
    /// Token cap for chat completions.
    pub max_tokens: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            channel_capacity: 32,
            temperature: 0.8,
            max_tokens: 2048,
        }
    }
}

/// The conversation orchestrator.
///
/// Cheap to clone; all collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct ChatOrchestrator {
    sessions: Arc<SessionRegistry>,
    ai: Arc<dyn AiProvider>,
    resolver: Arc<ProblemResolver>,
    store: Arc<dyn ChatStore>,
    config: OrchestratorConfig,
}

impl ChatOrchestrator {
    /// Creates an orchestrator with default configuration.
    pub fn new(
        sessions: Arc<SessionRegistry>,
        ai: Arc<dyn AiProvider>,
        resolver: Arc<ProblemResolver>,
        store: Arc<dyn ChatStore>,
    ) -> Self {
        Self::with_config(sessions, ai, resolver, store, OrchestratorConfig::default())
    }

    /// Creates an orchestrator with custom configuration.
    pub fn with_config(
        sessions: Arc<SessionRegistry>,
        ai: Arc<dyn AiProvider>,
        resolver: Arc<ProblemResolver>,
        store: Arc<dyn ChatStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            sessions,
            ai,
            resolver,
            store,
            config,
        }
    }

    /// Handles one user turn, returning the event stream for it.
    ///
    /// The turn runs on its own task; turns for the same session serialize on
    /// the session's lock while distinct sessions proceed in parallel. If the
    /// receiver is dropped mid-turn (client disconnect) the upstream model
    /// call is cancelled and whatever output accumulated is still recorded.
    pub fn handle_turn(&self, session_id: SessionId, text: String) -> mpsc::Receiver<OutputEvent> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let this = self.clone();
        tokio::spawn(async move {
            this.run_turn(session_id, text, tx).await;
        });
        rx
    }

    async fn run_turn(&self, session_id: SessionId, text: String, tx: mpsc::Sender<OutputEvent>) {
        let handle = self.sessions.get_or_create(session_id);
        let mut session = handle.lock().await;
        let mut sink = EventSink::new(tx);

        info!(%session_id, mode = ?session.mode(), "handling turn");
        match session.mode() {
            SessionMode::AwaitingClarification => {
                self.clarification_turn(&mut session, &text, &mut sink).await;
            }
            SessionMode::Idle => {
                self.idle_turn(&mut session, &text, &mut sink).await;
            }
        }
        debug!(%session_id, mode = ?session.mode(), "turn complete");
    }

    // ── Idle state ─────────────────────────────────────────────────────────

    async fn idle_turn(&self, session: &mut Session, text: &str, sink: &mut EventSink) {
        if text.trim().is_empty() {
            // Rejected without mutating any session state.
            sink.emit(OutputEvent::error("Please enter a message.")).await;
            return;
        }

        let turn_intent = intent::classify(text);

        if looks_like_reference(text) {
            match self.resolver.resolve(text).await {
                Ok(Some(problem)) => {
                    info!(problem_id = problem.id, title = %problem.title, "reference resolved");
                    self.begin_clarification(session, text, turn_intent, problem, sink)
                        .await;
                    return;
                }
                Ok(None) => debug!("identifier did not resolve; continuing as chat"),
                Err(err) => {
                    // Catalog trouble downgrades to "no reference found".
                    warn!(error = %err, "catalog resolution failed; continuing as chat");
                }
            }
        }

        self.chat_turn(session, text, turn_intent, sink).await;
    }

    /// Idle → AwaitingClarification: store context, ask the follow-up.
    async fn begin_clarification(
        &self,
        session: &mut Session,
        text: &str,
        turn_intent: Intent,
        problem: crate::domain::ResolvedProblem,
        sink: &mut EventSink,
    ) {
        session.push_turn(Role::User, text);
        self.persist(
            TurnRecord::new(session.id(), Role::User, text).with_intent(turn_intent),
        )
        .await;

        let question = AwaitedInput::TargetLanguage.question();
        sink.emit(OutputEvent::text(question)).await;
        session.push_turn(Role::Bot, question);
        self.persist(TurnRecord::new(session.id(), Role::Bot, question)).await;

        session.begin_clarification(ClarificationContext {
            awaiting: AwaitedInput::TargetLanguage,
            problem,
            wants_artifact: turn_intent == Intent::Visualization,
        });
    }

    /// Idle → Idle: classify, optionally attach an artifact, stream chat.
    async fn chat_turn(
        &self,
        session: &mut Session,
        text: &str,
        turn_intent: Intent,
        sink: &mut EventSink,
    ) {
        let prior = session.recent_history(self.config.history_window);
        session.push_turn(Role::User, text);
        self.persist(
            TurnRecord::new(session.id(), Role::User, text).with_intent(turn_intent),
        )
        .await;

        let system_prompt = match turn_intent {
            Intent::Visualization | Intent::Tutor => prompts::CS_TUTOR_PROMPT.to_string(),
            Intent::KnowledgeLookup => match knowledge::retrieve_context(text) {
                Some(context) => prompts::knowledge_prompt(&context),
                None => {
                    sink.emit(OutputEvent::text(prompts::NO_KNOWLEDGE_REPLY)).await;
                    session.push_turn(Role::Bot, prompts::NO_KNOWLEDGE_REPLY);
                    self.persist(TurnRecord::new(
                        session.id(),
                        Role::Bot,
                        prompts::NO_KNOWLEDGE_REPLY,
                    ))
                    .await;
                    return;
                }
            },
            Intent::General => prompts::GENERAL_PROMPT.to_string(),
        };

        // The artifact, when requested, leads the stream.
        let mut artifact_payload = None;
        if turn_intent == Intent::Visualization {
            artifact_payload = self.generate_visualization(text, sink).await;
        }

        let request = CompletionRequest::new()
            .with_system_prompt(system_prompt)
            .with_history(&prior)
            .with_message(MessageRole::User, text)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let full = self.stream_response(request, sink).await;
        session.push_turn(Role::Bot, &full);
        let mut record = TurnRecord::new(session.id(), Role::Bot, full);
        if let Some(payload) = artifact_payload {
            record = record.with_artifact(payload);
        }
        self.persist(record).await;
    }

    // ── AwaitingClarification state ────────────────────────────────────────

    async fn clarification_turn(&self, session: &mut Session, text: &str, sink: &mut EventSink) {
        if text.trim().is_empty() {
            match session.clarification() {
                Some(ctx) => {
                    // Context untouched; just re-ask.
                    sink.emit(OutputEvent::text(ctx.awaiting.question())).await;
                }
                None => self.recover_lost_context(session, sink).await,
            }
            return;
        }

        let Some(ctx) = session.take_clarification() else {
            self.recover_lost_context(session, sink).await;
            return;
        };

        let language = text.trim();
        let turn_intent = intent::classify(text);
        let prior = session.recent_history(self.config.history_window);
        session.push_turn(Role::User, text);
        self.persist(
            TurnRecord::new(session.id(), Role::User, text).with_intent(turn_intent),
        )
        .await;

        let mut system_prompt = prompts::problem_answer_prompt(&ctx.problem, language);
        if ctx.wants_artifact {
            system_prompt.push_str(prompts::ARTIFACT_INSTRUCTION);
        }
        let request = CompletionRequest::new()
            .with_system_prompt(system_prompt)
            .with_history(&prior)
            .with_message(MessageRole::User, text)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let (full, artifact_payload) = if ctx.wants_artifact {
            // Collect the whole response so the artifact can lead the output.
            self.collect_with_artifact(request, sink).await
        } else {
            (self.stream_response(request, sink).await, None)
        };

        session.push_turn(Role::Bot, &full);
        let mut record = TurnRecord::new(session.id(), Role::Bot, full);
        if let Some(payload) = artifact_payload {
            record = record.with_artifact(payload);
        }
        self.persist(record).await;
    }

    /// AwaitingClarification with a missing context: explain, reset to Idle.
    async fn recover_lost_context(&self, session: &mut Session, sink: &mut EventSink) {
        warn!(session_id = %session.id(), "clarification context missing; resetting session");
        session.take_clarification();
        sink.emit(OutputEvent::error(prompts::LOST_CONTEXT_MESSAGE)).await;
        session.push_turn(Role::Bot, prompts::LOST_CONTEXT_MESSAGE);
        self.persist(TurnRecord::new(
            session.id(),
            Role::Bot,
            prompts::LOST_CONTEXT_MESSAGE,
        ))
        .await;
    }

    // ── Shared plumbing ────────────────────────────────────────────────────

    /// Runs a structured visualization call, emitting the artifact on success.
    async fn generate_visualization(
        &self,
        query: &str,
        sink: &mut EventSink,
    ) -> Option<serde_json::Value> {
        let prompt = format!("{}\n\n{}", prompts::VISUALIZATION_PROMPT, query);
        let raw = match self.ai.complete_structured(prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "visualization generation failed");
                return None;
            }
        };

        let cleaned = artifact::strip_code_fence(&raw);
        match serde_json::from_str::<serde_json::Value>(&cleaned) {
            Ok(value)
                if value
                    .get(artifact::ARTIFACT_DISCRIMINATOR)
                    .is_some_and(serde_json::Value::is_string) =>
            {
                sink.emit(OutputEvent::artifact(value.clone())).await;
                Some(value)
            }
            Ok(_) => {
                warn!("visualization payload missing discriminator; dropping");
                None
            }
            Err(err) => {
                warn!(error = %err, "visualization payload did not parse; dropping");
                None
            }
        }
    }

    /// Streams a completion, forwarding each fragment as its own event.
    ///
    /// Returns the accumulated text. Upstream failure turns into the apology
    /// text so the turn still produces a recordable response; a disconnected
    /// client cancels the upstream stream but keeps the partial output.
    async fn stream_response(&self, request: CompletionRequest, sink: &mut EventSink) -> String {
        let mut full = String::new();

        let mut stream = match self.ai.stream_complete(request).await {
            Ok(stream) => stream,
            Err(err) => {
                error!(error = %err, "model call failed");
                sink.emit(OutputEvent::text(prompts::GENERATION_APOLOGY)).await;
                return prompts::GENERATION_APOLOGY.to_string();
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if !chunk.delta.is_empty() {
                        full.push_str(&chunk.delta);
                        sink.emit(OutputEvent::text(chunk.delta)).await;
                    }
                    if sink.client_gone() {
                        info!("client disconnected mid-stream; cancelling generation");
                        break;
                    }
                    if chunk.finish_reason.is_some() {
                        break;
                    }
                }
                Err(err) => {
                    error!(error = %err, "model stream failed");
                    sink.emit(OutputEvent::text(prompts::GENERATION_APOLOGY)).await;
                    if !full.is_empty() {
                        full.push_str("\n\n");
                    }
                    full.push_str(prompts::GENERATION_APOLOGY);
                    break;
                }
            }
        }

        if full.is_empty() {
            full.push_str(prompts::GENERATION_APOLOGY);
            sink.emit(OutputEvent::text(prompts::GENERATION_APOLOGY)).await;
        }
        full
    }

    /// Non-streaming completion whose output may embed an artifact block.
    /// The artifact event goes out ahead of the cleaned text.
    async fn collect_with_artifact(
        &self,
        request: CompletionRequest,
        sink: &mut EventSink,
    ) -> (String, Option<serde_json::Value>) {
        let raw = match self.ai.complete(request).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "model call failed");
                sink.emit(OutputEvent::text(prompts::GENERATION_APOLOGY)).await;
                return (prompts::GENERATION_APOLOGY.to_string(), None);
            }
        };

        let (cleaned, payload) = artifact::extract_artifact(&raw, true);
        if let Some(ref payload) = payload {
            sink.emit(OutputEvent::artifact(payload.clone())).await;
        }
        sink.emit(OutputEvent::text(cleaned.clone())).await;
        (cleaned, payload)
    }

    /// Best-effort durable write; failures are logged, never surfaced.
    async fn persist(&self, record: TurnRecord) {
        if let Err(err) = self.store.append_message(record).await {
            warn!(error = %err, "failed to persist turn; response unaffected");
        }
    }
}

/// Wraps the event channel so a disconnected client is observed once and
/// later emits become no-ops.
struct EventSink {
    tx: mpsc::Sender<OutputEvent>,
    client_gone: bool,
}

impl EventSink {
    fn new(tx: mpsc::Sender<OutputEvent>) -> Self {
        Self {
            tx,
            client_gone: false,
        }
    }

    async fn emit(&mut self, event: OutputEvent) {
        if self.client_gone {
            return;
        }
        if self.tx.send(event).await.is_err() {
            self.client_gone = true;
        }
    }

    fn client_gone(&self) -> bool {
        self.client_gone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::adapters::ai::MockAiProvider;
    use crate::adapters::persistence::InMemoryChatStore;
    use crate::domain::{CatalogEntry, ProblemDetail};
    use crate::ports::{CatalogError, ProblemCatalog};

    struct FakeCatalog {
        list_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProblemCatalog for FakeCatalog {
        async fn list_problems(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                CatalogEntry::new(1, "Two Sum", "two-sum"),
                CatalogEntry::new(2, "Add Two Numbers", "add-two-numbers"),
            ])
        }

        async fn fetch_problem(
            &self,
            slug: &str,
        ) -> Result<Option<ProblemDetail>, CatalogError> {
            if slug == "add-two-numbers" {
                Ok(Some(ProblemDetail {
                    id: 2,
                    title: "Add Two Numbers".to_string(),
                    difficulty: "Medium".to_string(),
                    body: "You are given two non-empty linked lists.".to_string(),
                    tags: vec!["Linked List".to_string()],
                }))
            } else if slug == "two-sum" {
                Ok(Some(ProblemDetail {
                    id: 1,
                    title: "Two Sum".to_string(),
                    difficulty: "Easy".to_string(),
                    body: "Given an array of integers nums and a target.".to_string(),
                    tags: vec!["Array".to_string()],
                }))
            } else {
                Ok(None)
            }
        }
    }

    struct Harness {
        orchestrator: ChatOrchestrator,
        sessions: Arc<SessionRegistry>,
        ai: Arc<MockAiProvider>,
        store: Arc<InMemoryChatStore>,
        catalog: Arc<FakeCatalog>,
    }

    fn harness(ai: MockAiProvider, store: InMemoryChatStore) -> Harness {
        let sessions = Arc::new(SessionRegistry::default());
        let ai = Arc::new(ai);
        let store = Arc::new(store);
        let catalog = Arc::new(FakeCatalog::new());
        let resolver = Arc::new(ProblemResolver::new(catalog.clone()));
        let orchestrator = ChatOrchestrator::new(
            sessions.clone(),
            ai.clone(),
            resolver,
            store.clone(),
        );
        Harness {
            orchestrator,
            sessions,
            ai,
            store,
            catalog,
        }
    }

    async fn collect(mut rx: mpsc::Receiver<OutputEvent>) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        events
    }

    async fn turn(h: &Harness, session_id: SessionId, text: &str) -> Vec<OutputEvent> {
        collect(h.orchestrator.handle_turn(session_id, text.to_string())).await
    }

    fn text_of(events: &[OutputEvent]) -> String {
        events
            .iter()
            .filter_map(|ev| match ev {
                OutputEvent::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    async fn mode_of(h: &Harness, session_id: SessionId) -> SessionMode {
        h.sessions.get_or_create(session_id).lock().await.mode()
    }

    #[tokio::test]
    async fn plain_chat_streams_without_resolution() {
        let h = harness(
            MockAiProvider::new().with_chunks(["Hello", " there!"]),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "hi").await;

        assert_eq!(text_of(&events), "Hello there!");
        assert_eq!(h.catalog.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);

        let records = h.store.recorded();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role, Role::User);
        assert_eq!(records[0].intent, Some(Intent::General));
        assert_eq!(records[1].content, "Hello there!");
    }

    #[tokio::test]
    async fn resolving_reference_asks_clarifying_question() {
        let h = harness(MockAiProvider::new(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "2. Add Two Numbers").await;

        assert_eq!(events.len(), 1);
        assert!(text_of(&events).contains("programming language"));
        assert_eq!(mode_of(&h, session_id).await, SessionMode::AwaitingClarification);
    }

    #[tokio::test]
    async fn empty_reply_re_emits_question_without_touching_context() {
        let h = harness(MockAiProvider::new(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        turn(&h, session_id, "2. Add Two Numbers").await;
        let events = turn(&h, session_id, "   ").await;

        assert!(text_of(&events).contains("programming language"));
        assert_eq!(mode_of(&h, session_id).await, SessionMode::AwaitingClarification);

        let handle = h.sessions.get_or_create(session_id);
        let session = handle.lock().await;
        assert_eq!(session.clarification().unwrap().problem.id, 2);
    }

    #[tokio::test]
    async fn language_answer_resolves_clarification_and_returns_to_idle() {
        let h = harness(
            MockAiProvider::new().with_chunks(["Here is the Go solution."]),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        turn(&h, session_id, "2. Add Two Numbers").await;
        let events = turn(&h, session_id, "Go").await;

        assert_eq!(text_of(&events), "Here is the Go solution.");
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);

        // The composite prompt carries both the problem body and the answer.
        let requests = h.ai.recorded_requests();
        let system = requests[0].system_prompt.clone().unwrap();
        assert!(system.contains("linked lists"));
        assert!(system.contains("Go"));
    }

    #[tokio::test]
    async fn corrupted_clarification_state_resets_to_idle() {
        let h = harness(MockAiProvider::new(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        {
            let handle = h.sessions.get_or_create(session_id);
            handle.lock().await.set_mode(SessionMode::AwaitingClarification);
        }

        let events = turn(&h, session_id, "Python").await;

        assert!(matches!(events[0], OutputEvent::Error { .. }));
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);
    }

    #[tokio::test]
    async fn empty_input_while_idle_rejects_without_mutation() {
        let h = harness(MockAiProvider::new(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "  ").await;

        assert!(matches!(events[0], OutputEvent::Error { .. }));
        let handle = h.sessions.get_or_create(session_id);
        assert_eq!(handle.lock().await.history_len(), 0);
        assert!(h.store.recorded().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_emits_apology_and_records_turn() {
        let h = harness(MockAiProvider::failing(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "hello there").await;

        assert_eq!(text_of(&events), prompts::GENERATION_APOLOGY);
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);
        let records = h.store.recorded();
        assert_eq!(records[1].content, prompts::GENERATION_APOLOGY);
    }

    #[tokio::test]
    async fn upstream_failure_during_clarification_still_clears_context() {
        let h = harness(MockAiProvider::failing(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        // The resolver works; only generation fails.
        turn(&h, session_id, "2. Add Two Numbers").await;
        assert_eq!(mode_of(&h, session_id).await, SessionMode::AwaitingClarification);

        let events = turn(&h, session_id, "Rust").await;
        assert_eq!(text_of(&events), prompts::GENERATION_APOLOGY);
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_block_response() {
        let h = harness(
            MockAiProvider::new().with_chunks(["Still here."]),
            InMemoryChatStore::failing(),
        );
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "hi").await;
        assert_eq!(text_of(&events), "Still here.");
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);
    }

    #[tokio::test]
    async fn visualization_intent_emits_artifact_before_text() {
        let payload = json!({
            "visualizationType": "array",
            "algorithm": "two_sum",
            "steps": [{"message": "compare"}]
        });
        let h = harness(
            MockAiProvider::new()
                .with_structured(payload.to_string())
                .with_chunks(["Walking through it now."]),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "visualize two sum for me").await;

        assert!(matches!(events[0], OutputEvent::Artifact { .. }));
        assert_eq!(text_of(&events), "Walking through it now.");

        let records = h.store.recorded();
        assert_eq!(records[0].intent, Some(Intent::Visualization));
        assert_eq!(records[1].artifact.as_ref().unwrap()["visualizationType"], "array");
    }

    #[tokio::test]
    async fn malformed_visualization_payload_degrades_to_text_only() {
        let h = harness(
            MockAiProvider::new()
                .with_structured("{not valid json")
                .with_chunks(["Text anyway."]),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "visualize quicksort").await;
        assert!(events.iter().all(|ev| ev.kind() != "artifact"));
        assert_eq!(text_of(&events), "Text anyway.");
    }

    #[tokio::test]
    async fn clarified_artifact_request_leads_with_artifact() {
        let payload = json!({
            "visualizationType": "linked_list",
            "algorithm": "add_two_numbers",
            "steps": [{"message": "carry the one"}]
        });
        let response = format!("Here is the dry run.\n```json\n{payload}\n```\nDone.");
        let h = harness(
            MockAiProvider::new().with_completion(response),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        turn(&h, session_id, "visualize leetcode 2. add two numbers").await;
        assert_eq!(mode_of(&h, session_id).await, SessionMode::AwaitingClarification);

        let events = turn(&h, session_id, "Python").await;

        assert!(matches!(events[0], OutputEvent::Artifact { .. }));
        let text = text_of(&events);
        assert!(text.contains("Here is the dry run."));
        assert!(!text.contains("```"));
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);
    }

    #[tokio::test]
    async fn knowledge_lookup_without_match_returns_canned_reply() {
        let h = harness(MockAiProvider::new(), InMemoryChatStore::new());
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "what is the weather like").await;
        assert_eq!(text_of(&events), prompts::NO_KNOWLEDGE_REPLY);
        assert_eq!(mode_of(&h, session_id).await, SessionMode::Idle);
    }

    #[tokio::test]
    async fn knowledge_lookup_with_match_streams_grounded_answer() {
        let h = harness(
            MockAiProvider::new().with_chunks(["Recursion is when..."]),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        let events = turn(&h, session_id, "what is recursion").await;
        assert_eq!(text_of(&events), "Recursion is when...");

        let requests = h.ai.recorded_requests();
        assert!(requests[0]
            .system_prompt
            .as_deref()
            .unwrap()
            .contains("RECURSION"));
    }

    #[tokio::test]
    async fn history_window_is_respected_in_requests() {
        let h = harness(
            MockAiProvider::new().with_chunks(["ok"]),
            InMemoryChatStore::new(),
        );
        let session_id = SessionId::new();

        for i in 0..6 {
            turn(&h, session_id, &format!("message number {i}")).await;
        }

        let requests = h.ai.recorded_requests();
        let last = requests.last().unwrap();
        // 5 turns of context plus the current user message.
        assert_eq!(last.messages.len(), DEFAULT_HISTORY_WINDOW + 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let h = harness(
            MockAiProvider::new().with_chunks(["ok"]),
            InMemoryChatStore::new(),
        );
        let a = SessionId::new();
        let b = SessionId::new();

        turn(&h, a, "2. Add Two Numbers").await;
        let events = turn(&h, b, "hi").await;

        assert_eq!(mode_of(&h, a).await, SessionMode::AwaitingClarification);
        assert_eq!(mode_of(&h, b).await, SessionMode::Idle);
        assert_eq!(text_of(&events), "ok");
    }
}
