//! Core chat domain types
//!
//! A session's durable state is its ordered message history plus the user's
//! financial profile. History is append-only; persisted entries are never
//! reordered or dropped (`clear` replaces the whole history with an empty one).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::profile::Profile;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system")
        }
    }
}

/// A single entry in a session's conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role:      Role,
    pub content:   String,
    /// RFC-3339 on the wire via chrono's serde support
    pub timestamp: DateTime<Utc>,
    /// Idempotency tag set on injected briefings; repeated delivery with the
    /// same key is acknowledged without appending a second message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub briefing_key: Option<String>
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), timestamp: Utc::now(), briefing_key: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), timestamp: Utc::now(), briefing_key: None }
    }

    pub fn briefing(content: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            role:          Role::Assistant,
            content:       content.into(),
            timestamp:     Utc::now(),
            briefing_key:  Some(key.into())
        }
    }
}

/// Reply returned by `send_message`: the assistant message that was appended
/// and durably persisted before the caller sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub content:   String,
    pub timestamp: DateTime<Utc>
}

/// The full durable state of one entity's session
///
/// Exactly one in-memory copy of this exists per entity id (owned by the
/// session actor); the persisted record is the source of truth across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub profile: Profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn briefing_key_is_omitted_when_absent() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("briefingKey").is_none());

        let tagged = ChatMessage::briefing("news", "wf-1");
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["briefingKey"], "wf-1");
    }

    #[test]
    fn session_state_roundtrips() {
        let mut state = SessionState::default();
        state.history.push(ChatMessage::user("hi"));
        state.history.push(ChatMessage::assistant("hello"));

        let bytes = serde_json::to_vec(&state).unwrap();
        let back: SessionState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, state);
    }
}
