//! Session Actor - the durable per-entity actor
//!
//! One logical instance per entity id, spawned by the registry. The actor owns
//! the only mutable copy of its session state:
//! - State is loaded from the store exactly once, in `pre_start`, before any
//!   message is handled
//! - The mailbox serializes every operation against the id
//! - Mutating operations work on a copy and commit it to memory only after the
//!   store accepted the write, so a reply always implies durably saved state

use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::{Level, event};

use crate::{
    AppContext,
    actor::message::SessionMessage,
    config::{InferencePolicy, LlmConfig},
    domain::{
        chat::{ChatMessage, ChatReply, Role, SessionState},
        constant::session,
        error::CoachError,
        profile::{Profile, ProfilePatch}
    },
    port::{invoker::{LlmInvoker, PromptMessage}, store::StateStore}
};

/// Generation context instruction; the profile summary is appended when any
/// profile field has been recorded
const SYSTEM_PROMPT: &str = "You are a pragmatic personal budgeting coach. Keep answers short, concrete and \
                             encouraging, and ground advice in the user's profile when one is provided.";

/// Assistant text used when the invoker fails and the policy is `Fallback`
pub const FALLBACK_REPLY: &str =
    "I'm having trouble putting together a response right now. Please try again in a moment.";

/// Marker prefixed to injected briefing messages
pub const BRIEFING_PREFIX: &str = "📰 Daily briefing: ";

/// Most recent history entries included in the generation context
const CONTEXT_WINDOW: usize = 20;

/// Session Actor State
pub struct SessionActorState {
    /// Entity id (this IS the persistence id in the state store)
    pub entity_id: String,
    /// Durable backing store for the session state
    pub store:     Arc<dyn StateStore>,
    /// Text-generation collaborator
    pub invoker:   Arc<dyn LlmInvoker>,
    /// Generation parameters and failure policy
    pub llm:       LlmConfig,
    /// The single in-memory copy of the durable state
    pub data:      SessionState
}

/// Session Actor - handles all operations for a single entity
pub struct SessionActor;

#[async_trait::async_trait]
impl Actor for SessionActor {
    type Arguments = (String, Arc<AppContext>);
    type Msg = SessionMessage;
    type State = SessionActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        (entity_id, app_context): Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = session::SESSION_STARTED, entity_id = %entity_id);

        // Load-once contract: persisted state is read here, before the first
        // message, and never again during this actor's lifetime
        let data = match app_context.state_store.load_state(&entity_id).await {
            Ok(Some(state)) => {
                event!(Level::DEBUG, event = session::STATE_LOADED,
                       entity_id = %entity_id, entries = %state.history.len());
                state
            }
            Ok(None) => {
                event!(Level::DEBUG, event = session::STATE_FRESH, entity_id = %entity_id);
                SessionState::default()
            }
            Err(e) => return Err(ActorProcessingErr::from(e))
        };

        Ok(SessionActorState {
            entity_id,
            store: app_context.state_store.clone(),
            invoker: app_context.invoker.clone(),
            llm: app_context.config.llm.clone(),
            data
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionMessage::SendMessage { text, reply } => {
                let result = self.handle_send_message(text, state).await;
                let _ = reply.send(result);
            }
            SessionMessage::GetHistory { reply } => {
                let _ = reply.send(Ok(state.data.history.clone()));
            }
            SessionMessage::UpdateProfile { patch, reply } => {
                let result = self.handle_update_profile(patch, state).await;
                let _ = reply.send(result);
            }
            SessionMessage::GetProfile { reply } => {
                let _ = reply.send(Ok(state.data.profile.clone()));
            }
            SessionMessage::InjectBriefing { text, idempotency_key, reply } => {
                let result = self.handle_inject_briefing(text, idempotency_key, state).await;
                let _ = reply.send(result);
            }
            SessionMessage::Clear { reply } => {
                let result = self.handle_clear(state).await;
                let _ = reply.send(result);
            }
        }
        Ok(())
    }
}

impl SessionActor {
    /// Append the user message, generate a reply, persist, answer
    async fn handle_send_message(
        &self,
        text: String,
        state: &mut SessionActorState
    ) -> Result<ChatReply, CoachError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoachError::Validation("Message must not be empty".to_string()));
        }

        event!(Level::DEBUG, event = session::MESSAGE_RECEIVED,
               entity_id = %state.entity_id, chars = %trimmed.len());

        let mut next = state.data.clone();
        next.history.push(ChatMessage::user(trimmed));

        let prompt = build_prompt(&next);
        let generated = match tokio::time::timeout(
            state.llm.timeout(),
            state.invoker.invoke(&prompt, state.llm.max_tokens, state.llm.temperature)
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => self.recover_inference(e, state)?,
            Err(_) => self.recover_inference(
                CoachError::Timeout(format!("Inference timed out after {}s", state.llm.timeout_secs)),
                state
            )?
        };

        let assistant = ChatMessage::assistant(generated);
        let reply = ChatReply { content: assistant.content.clone(), timestamp: assistant.timestamp };
        next.history.push(assistant);

        self.persist(&next, state).await?;
        state.data = next;

        event!(Level::DEBUG, event = session::MESSAGE_ANSWERED,
               entity_id = %state.entity_id, history_len = %state.data.history.len());

        Ok(reply)
    }

    /// Apply the configured policy to an invoker failure
    fn recover_inference(&self, error: CoachError, state: &SessionActorState) -> Result<String, CoachError> {
        match state.llm.on_failure {
            InferencePolicy::Fallback => {
                event!(Level::WARN, event = session::INFERENCE_FALLBACK,
                       entity_id = %state.entity_id, error = %error);
                Ok(FALLBACK_REPLY.to_string())
            }
            InferencePolicy::Propagate => Err(error)
        }
    }

    /// Merge a partial update over the existing profile
    async fn handle_update_profile(
        &self,
        patch: ProfilePatch,
        state: &mut SessionActorState
    ) -> Result<Profile, CoachError> {
        let mut next = state.data.clone();
        next.profile.apply(patch);

        self.persist(&next, state).await?;
        state.data = next;

        event!(Level::DEBUG, event = session::PROFILE_UPDATED, entity_id = %state.entity_id);

        Ok(state.data.profile.clone())
    }

    /// Append a marked briefing message, at most once per idempotency key
    async fn handle_inject_briefing(
        &self,
        text: String,
        idempotency_key: String,
        state: &mut SessionActorState
    ) -> Result<(), CoachError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoachError::Validation("Briefing text must not be empty".to_string()));
        }

        // A retried delivery whose effect already landed must not append twice
        if state.data.history.iter().any(|m| m.briefing_key.as_deref() == Some(idempotency_key.as_str())) {
            event!(Level::DEBUG, event = session::BRIEFING_DUPLICATE,
                   entity_id = %state.entity_id, key = %idempotency_key);
            return Ok(());
        }

        let mut next = state.data.clone();
        next.history.push(ChatMessage::briefing(format!("{}{}", BRIEFING_PREFIX, trimmed), idempotency_key.as_str()));

        self.persist(&next, state).await?;
        state.data = next;

        event!(Level::DEBUG, event = session::BRIEFING_INJECTED,
               entity_id = %state.entity_id, key = %idempotency_key);

        Ok(())
    }

    /// Empty the history, keeping the profile
    async fn handle_clear(&self, state: &mut SessionActorState) -> Result<(), CoachError> {
        let mut next = state.data.clone();
        next.history.clear();

        self.persist(&next, state).await?;
        state.data = next;

        event!(Level::DEBUG, event = session::HISTORY_CLEARED, entity_id = %state.entity_id);

        Ok(())
    }

    async fn persist(&self, next: &SessionState, state: &SessionActorState) -> Result<(), CoachError> {
        if let Err(e) = state.store.save_state(&state.entity_id, next).await {
            event!(Level::ERROR, event = session::STATE_PERSIST_FAILED,
                   entity_id = %state.entity_id, error = %e);
            return Err(e);
        }
        Ok(())
    }
}

/// Build the generation context: the system instruction (plus the profile
/// summary when present) followed by the most recent history entries,
/// oldest first
fn build_prompt(state: &SessionState) -> Vec<PromptMessage> {
    let mut system = SYSTEM_PROMPT.to_string();
    if let Some(summary) = state.profile.summary() {
        system.push_str("\n\nUser profile: ");
        system.push_str(&summary);
    }

    let mut messages = Vec::with_capacity(CONTEXT_WINDOW + 1);
    messages.push(PromptMessage::new(Role::System, system));

    let start = state.history.len().saturating_sub(CONTEXT_WINDOW);
    messages.extend(state.history[start..].iter().map(|m| PromptMessage::new(m.role, m.content.clone())));

    messages
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ractor::rpc::{CallResult, call};

    use super::*;
    use crate::{
        adapter::{StoreBackend, StoreFactory, feed::SampleHeadlineFeed},
        config::Config,
        domain::profile::ProfilePatch
    };

    /// Deterministic invoker echoing the last user message
    struct EchoInvoker;

    #[async_trait]
    impl LlmInvoker for EchoInvoker {
        async fn invoke(&self, messages: &[PromptMessage], _: u32, _: f32) -> Result<String, CoachError> {
            let last = messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.clone());
            Ok(format!("echo: {}", last.unwrap_or_default()))
        }
    }

    /// Invoker that always fails
    struct FailingInvoker;

    #[async_trait]
    impl LlmInvoker for FailingInvoker {
        async fn invoke(&self, _: &[PromptMessage], _: u32, _: f32) -> Result<String, CoachError> {
            Err(CoachError::Inference("model unavailable".to_string()))
        }
    }

    fn test_context(config: Config, invoker: Arc<dyn LlmInvoker>) -> Arc<AppContext> {
        let (state_store, checkpoints) = StoreFactory::create(StoreBackend::InMemory).unwrap();
        Arc::new(AppContext {
            config,
            state_store,
            checkpoints,
            invoker,
            feed: Arc::new(SampleHeadlineFeed::new())
        })
    }

    async fn spawn_session(ctx: &Arc<AppContext>, entity_id: &str) -> ActorRef<SessionMessage> {
        let (session, _handle) =
            Actor::spawn(None, SessionActor, (entity_id.to_string(), ctx.clone())).await.unwrap();
        session
    }

    async fn send(session: &ActorRef<SessionMessage>, text: &str) -> Result<ChatReply, CoachError> {
        match call(session, |reply| SessionMessage::SendMessage { text: text.to_string(), reply }, None).await {
            Ok(CallResult::Success(result)) => result,
            _ => panic!("unexpected call result")
        }
    }

    async fn history(session: &ActorRef<SessionMessage>) -> Vec<ChatMessage> {
        match call(session, |reply| SessionMessage::GetHistory { reply }, None).await {
            Ok(CallResult::Success(Ok(history))) => history,
            _ => panic!("unexpected call result")
        }
    }

    async fn inject(session: &ActorRef<SessionMessage>, text: &str, key: &str) -> Result<(), CoachError> {
        match call(
            session,
            |reply| SessionMessage::InjectBriefing {
                text:            text.to_string(),
                idempotency_key: key.to_string(),
                reply
            },
            None
        )
        .await
        {
            Ok(CallResult::Success(result)) => result,
            _ => panic!("unexpected call result")
        }
    }

    #[tokio::test]
    async fn send_message_appends_user_then_assistant() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        let reply = send(&session, "How do I budget?").await.unwrap();
        assert_eq!(reply.content, "echo: How do I budget?");

        let history = history(&session).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "How do I budget?");
        assert_eq!(history[1].role, Role::Assistant);
        assert!(!history[1].content.is_empty());
        assert!(history[0].timestamp < history[1].timestamp);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_mutation() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        let result = send(&session, "   ").await;
        assert!(matches!(result, Err(CoachError::Validation(_))));

        assert!(history(&session).await.is_empty());
        assert!(ctx.state_store.load_state("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reply_is_persisted_before_the_caller_sees_it() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        send(&session, "hello").await.unwrap();

        let persisted = ctx.state_store.load_state("u1").await.unwrap().unwrap();
        assert_eq!(persisted.history.len(), 2);
    }

    #[tokio::test]
    async fn inference_failure_falls_back_by_default() {
        let ctx = test_context(Config::default(), Arc::new(FailingInvoker));
        let session = spawn_session(&ctx, "u1").await;

        let reply = send(&session, "hello").await.unwrap();
        assert_eq!(reply.content, FALLBACK_REPLY);

        let history = history(&session).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn inference_failure_propagates_when_configured() {
        let mut config = Config::default();
        config.llm.on_failure = InferencePolicy::Propagate;
        let ctx = test_context(config, Arc::new(FailingInvoker));
        let session = spawn_session(&ctx, "u1").await;

        let result = send(&session, "hello").await;
        assert!(matches!(result, Err(CoachError::Inference(_))));

        // Nothing was appended or persisted
        assert!(history(&session).await.is_empty());
        assert!(ctx.state_store.load_state("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_updates_merge_and_answers_use_them() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        let first = ProfilePatch { total_debt: Some(2000.0), ..Default::default() };
        let second = ProfilePatch { monthly_income: Some(1500.0), ..Default::default() };

        for patch in [first, second] {
            match call(&session, |reply| SessionMessage::UpdateProfile { patch: patch.clone(), reply }, None).await {
                Ok(CallResult::Success(Ok(_))) => {}
                _ => panic!("unexpected call result")
            }
        }

        let profile = match call(&session, |reply| SessionMessage::GetProfile { reply }, None).await {
            Ok(CallResult::Success(Ok(profile))) => profile,
            _ => panic!("unexpected call result")
        };
        assert_eq!(profile.total_debt, Some(2000.0));
        assert_eq!(profile.monthly_income, Some(1500.0));
        assert!(profile.last_updated.is_some());
    }

    #[tokio::test]
    async fn inject_briefing_applies_each_key_at_most_once() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        inject(&session, "X", "W1").await.unwrap();
        inject(&session, "X", "W1").await.unwrap();

        let history = history(&session).await;
        let briefings: Vec<_> = history.iter().filter(|m| m.content.contains('X')).collect();
        assert_eq!(briefings.len(), 1);
        assert!(briefings[0].content.starts_with(BRIEFING_PREFIX));
        assert_eq!(briefings[0].briefing_key.as_deref(), Some("W1"));
    }

    #[tokio::test]
    async fn inject_briefing_rejects_empty_text() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        let result = inject(&session, "  ", "W1").await;
        assert!(matches!(result, Err(CoachError::Validation(_))));
    }

    #[tokio::test]
    async fn clear_empties_history_but_keeps_the_profile() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));
        let session = spawn_session(&ctx, "u1").await;

        send(&session, "hello").await.unwrap();
        let patch = ProfilePatch { monthly_income: Some(1500.0), ..Default::default() };
        let _ = call(&session, |reply| SessionMessage::UpdateProfile { patch, reply }, None).await.unwrap();

        match call(&session, |reply| SessionMessage::Clear { reply }, None).await {
            Ok(CallResult::Success(Ok(()))) => {}
            _ => panic!("unexpected call result")
        }

        assert!(history(&session).await.is_empty());

        let persisted = ctx.state_store.load_state("u1").await.unwrap().unwrap();
        assert!(persisted.history.is_empty());
        assert_eq!(persisted.profile.monthly_income, Some(1500.0));
    }

    #[tokio::test]
    async fn state_survives_an_actor_restart() {
        let ctx = test_context(Config::default(), Arc::new(EchoInvoker));

        let session = spawn_session(&ctx, "u1").await;
        send(&session, "remember me").await.unwrap();
        session.stop(None);

        // A fresh actor over the same store sees the persisted history
        let session = spawn_session(&ctx, "u1").await;
        let history = history(&session).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "remember me");
    }

    #[test]
    fn prompt_includes_system_instruction_and_recent_window() {
        let mut state = SessionState::default();
        for i in 0..25 {
            state.history.push(ChatMessage::user(format!("message {}", i)));
        }

        let prompt = build_prompt(&state);
        assert_eq!(prompt.len(), CONTEXT_WINDOW + 1);
        assert_eq!(prompt[0].role, Role::System);
        // Oldest entry in the window is message 5, newest is message 24
        assert_eq!(prompt[1].content, "message 5");
        assert_eq!(prompt.last().unwrap().content, "message 24");
    }

    #[test]
    fn prompt_carries_the_profile_summary_when_present() {
        let mut state = SessionState::default();
        state.profile.apply(ProfilePatch { monthly_income: Some(1500.0), ..Default::default() });
        state.history.push(ChatMessage::user("hi"));

        let prompt = build_prompt(&state);
        assert!(prompt[0].content.contains("monthly income $1500.00"));
    }
}
