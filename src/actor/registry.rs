//! Session Registry - routes entity ids to their session actors
//!
//! Resolve is get-or-spawn: at most one session actor exists per entity id
//! under this registry, so all operations for an id funnel through a single
//! mailbox.

use std::{collections::HashMap, sync::Arc};

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::{Level, event};

use crate::{
    AppContext,
    actor::{
        message::{RegistryMessage, SessionMessage},
        session::SessionActor
    },
    domain::{constant::registry, error::CoachError}
};

/// Registry state tracking live sessions
pub struct SessionRegistryState {
    /// Live session actors by entity id
    pub sessions:              HashMap<String, ActorRef<SessionMessage>>,
    /// Shared application context handed to spawned sessions
    pub app_context:           Arc<AppContext>,
    /// Sessions spawned since registry start
    pub total_sessions_spawned: u64
}

pub struct SessionRegistry;

#[async_trait::async_trait]
impl Actor for SessionRegistry {
    type Arguments = Arc<AppContext>;
    type Msg = RegistryMessage;
    type State = SessionRegistryState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        app_context: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = registry::REGISTRY_STARTED);

        Ok(SessionRegistryState { sessions: HashMap::new(), app_context, total_sessions_spawned: 0 })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RegistryMessage::Resolve { entity_id, reply } => {
                let result = self.resolve(&myself, entity_id, state).await;
                let _ = reply.send(result);
            }
            RegistryMessage::ActiveSessions { reply } => {
                let _ = reply.send(state.sessions.len());
            }
        }
        Ok(())
    }
}

impl SessionRegistry {
    /// Return the live session actor for the id, spawning one if absent
    async fn resolve(
        &self,
        myself: &ActorRef<RegistryMessage>,
        entity_id: String,
        state: &mut SessionRegistryState
    ) -> Result<ActorRef<SessionMessage>, CoachError> {
        if let Some(session) = state.sessions.get(&entity_id) {
            event!(Level::DEBUG, event = registry::SESSION_RESOLVED, entity_id = %entity_id, spawned = false);
            return Ok(session.clone());
        }

        match Actor::spawn_linked(
            None,
            SessionActor,
            (entity_id.clone(), state.app_context.clone()),
            myself.get_cell()
        )
        .await
        {
            Ok((session, _handle)) => {
                state.sessions.insert(entity_id.clone(), session.clone());
                state.total_sessions_spawned += 1;
                event!(Level::DEBUG, event = registry::SESSION_SPAWNED,
                       entity_id = %entity_id, active = %state.sessions.len());
                Ok(session)
            }
            Err(e) => {
                event!(Level::ERROR, event = registry::SESSION_SPAWN_FAILED,
                       entity_id = %entity_id, error = %e);
                Err(CoachError::Spawn(e.to_string()))
            }
        }
    }
}
