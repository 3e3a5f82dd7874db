//! Typed client over the actor system
//!
//! Wraps the guardian ref so callers (CLI, workflow steps) talk to sessions
//! with plain async methods instead of raw message enums.

use std::time::Duration;

use ractor::{
    ActorRef,
    rpc::{CallResult, call}
};

use crate::{
    actor::message::{GuardianMessage, SessionMessage},
    domain::{
        chat::{ChatMessage, ChatReply},
        error::CoachError,
        profile::{Profile, ProfilePatch}
    }
};

const CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Cheap-to-clone handle for talking to sessions through the guardian
#[derive(Clone)]
pub struct SessionClient {
    guardian: ActorRef<GuardianMessage>
}

impl SessionClient {
    pub fn new(guardian: ActorRef<GuardianMessage>) -> Self {
        Self { guardian }
    }

    /// Append a user message and return the generated reply
    pub async fn send_message(&self, entity_id: &str, text: impl Into<String>) -> Result<ChatReply, CoachError> {
        let text = text.into();
        self.call_session(entity_id, move |reply| SessionMessage::SendMessage { text, reply }).await
    }

    /// Read the full ordered history
    pub async fn get_history(&self, entity_id: &str) -> Result<Vec<ChatMessage>, CoachError> {
        self.call_session(entity_id, |reply| SessionMessage::GetHistory { reply }).await
    }

    /// Merge a partial profile update and return the resulting profile
    pub async fn update_profile(&self, entity_id: &str, patch: ProfilePatch) -> Result<Profile, CoachError> {
        self.call_session(entity_id, move |reply| SessionMessage::UpdateProfile { patch, reply }).await
    }

    /// Read the current profile
    pub async fn get_profile(&self, entity_id: &str) -> Result<Profile, CoachError> {
        self.call_session(entity_id, |reply| SessionMessage::GetProfile { reply }).await
    }

    /// Append a briefing message, at most once per idempotency key
    pub async fn inject_briefing(
        &self,
        entity_id: &str,
        text: impl Into<String>,
        idempotency_key: impl Into<String>
    ) -> Result<(), CoachError> {
        let text = text.into();
        let idempotency_key = idempotency_key.into();
        self.call_session(entity_id, move |reply| SessionMessage::InjectBriefing { text, idempotency_key, reply })
            .await
    }

    /// Empty the history, keeping the profile
    pub async fn clear(&self, entity_id: &str) -> Result<(), CoachError> {
        self.call_session(entity_id, |reply| SessionMessage::Clear { reply }).await
    }

    async fn resolve(&self, entity_id: &str) -> Result<ActorRef<SessionMessage>, CoachError> {
        let entity_id = entity_id.to_string();
        let result = call(
            &self.guardian,
            |reply| GuardianMessage::ResolveSession { entity_id, reply },
            Some(CALL_TIMEOUT)
        )
        .await;

        match result {
            Ok(CallResult::Success(resolved)) => resolved,
            Ok(CallResult::Timeout) => Err(CoachError::Timeout("Session resolution timed out".to_string())),
            Ok(CallResult::SenderError) | Err(_) => {
                Err(CoachError::Generic("Session resolution failed".to_string()))
            }
        }
    }

    async fn call_session<T: Send + 'static>(
        &self,
        entity_id: &str,
        make_message: impl FnOnce(ractor::RpcReplyPort<Result<T, CoachError>>) -> SessionMessage
    ) -> Result<T, CoachError> {
        let session = self.resolve(entity_id).await?;

        match call(&session, make_message, Some(CALL_TIMEOUT)).await {
            Ok(CallResult::Success(result)) => result,
            Ok(CallResult::Timeout) => Err(CoachError::Timeout("Session call timed out".to_string())),
            Ok(CallResult::SenderError) | Err(_) => {
                Err(CoachError::Generic("Session call failed".to_string()))
            }
        }
    }
}
