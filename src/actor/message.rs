//! Typed messages for actor communication

use ractor::{ActorRef, Message, RpcReplyPort};

use crate::domain::{
    chat::{ChatMessage, ChatReply},
    error::CoachError,
    profile::{Profile, ProfilePatch}
};

/// Messages for the Guardian actor (root of actor system)
#[derive(Debug)]
pub enum GuardianMessage {
    /// Initialize the actor system
    Initialize,
    /// Resolve the session actor for an entity id
    ResolveSession {
        entity_id: String,
        reply:     RpcReplyPort<Result<ActorRef<SessionMessage>, CoachError>>
    },
    /// Shutdown the entire system
    Shutdown,
    /// System health check
    HealthCheck { reply: RpcReplyPort<SystemHealth> }
}

/// Messages for the SessionRegistry actor
#[derive(Debug)]
pub enum RegistryMessage {
    /// Resolve (get-or-spawn) the session actor for an entity id
    Resolve {
        entity_id: String,
        reply:     RpcReplyPort<Result<ActorRef<SessionMessage>, CoachError>>
    },
    /// Get active session count
    ActiveSessions { reply: RpcReplyPort<usize> }
}

/// Messages for Session actors (per-entity); the mailbox serializes them, which
/// is what upholds the single-writer invariant for one entity id
#[derive(Debug)]
pub enum SessionMessage {
    /// Append a user message, generate and append the assistant reply
    SendMessage {
        text:  String,
        reply: RpcReplyPort<Result<ChatReply, CoachError>>
    },
    /// Read the full ordered history
    GetHistory { reply: RpcReplyPort<Result<Vec<ChatMessage>, CoachError>> },
    /// Merge a partial profile update
    UpdateProfile {
        patch: ProfilePatch,
        reply: RpcReplyPort<Result<Profile, CoachError>>
    },
    /// Read the current profile
    GetProfile { reply: RpcReplyPort<Result<Profile, CoachError>> },
    /// Append a briefing message unless the idempotency key was already applied
    InjectBriefing {
        text:            String,
        idempotency_key: String,
        reply:           RpcReplyPort<Result<(), CoachError>>
    },
    /// Empty the history, keeping the profile
    Clear { reply: RpcReplyPort<Result<(), CoachError>> }
}

/// System health information
#[derive(Debug)]
pub struct SystemHealth {
    pub active_sessions: usize,
    pub uptime_seconds:  u64
}

// Implement Message trait for Ractor
impl Message for GuardianMessage {}
impl Message for RegistryMessage {}
impl Message for SessionMessage {}
