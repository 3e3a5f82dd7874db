//! Guardian Actor - root of the actor hierarchy
//!
//! Supervises the session registry and fronts the system for callers:
//! - Spawns children on `Initialize`
//! - Proxies session resolution to the registry
//! - Answers health checks and coordinates shutdown

use std::{sync::Arc, time::Duration};

use ractor::{Actor, ActorProcessingErr, ActorRef, SpawnErr, rpc::{CallResult, call}};
use tracing::{Level, event};

use crate::{
    AppContext,
    actor::{
        message::{GuardianMessage, RegistryMessage, SessionMessage, SystemHealth},
        registry::SessionRegistry
    },
    domain::{constant::guardian, error::CoachError}
};

const REGISTRY_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Guardian state - tracks child actors and system status
pub struct GuardianState {
    pub registry:       Option<ActorRef<RegistryMessage>>,
    pub app_context:    Arc<AppContext>,
    pub startup_time:   std::time::Instant,
    pub is_initialized: bool
}

pub struct Guardian;

impl Guardian {
    /// Spawn the guardian and initialize its children
    pub async fn spawn_system(app_context: Arc<AppContext>) -> Result<ActorRef<GuardianMessage>, SpawnErr> {
        let (guardian, _handle) = Actor::spawn(None, Guardian, app_context).await?;
        // The mailbox is FIFO, so Initialize lands before any caller message
        let _ = guardian.cast(GuardianMessage::Initialize);
        Ok(guardian)
    }
}

#[async_trait::async_trait]
impl Actor for Guardian {
    type Arguments = Arc<AppContext>;
    type Msg = GuardianMessage;
    type State = GuardianState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        app_context: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = guardian::GUARDIAN_STARTED);

        Ok(GuardianState {
            registry: None,
            app_context,
            startup_time: std::time::Instant::now(),
            is_initialized: false
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            GuardianMessage::Initialize => {
                if state.is_initialized {
                    return Ok(());
                }

                event!(Level::DEBUG, event = guardian::CHILDREN_SPAWNING);

                match Actor::spawn_linked(
                    None,
                    SessionRegistry,
                    state.app_context.clone(),
                    myself.get_cell()
                )
                .await
                {
                    Ok((registry, _handle)) => {
                        state.registry = Some(registry);
                        state.is_initialized = true;
                        event!(Level::DEBUG, event = guardian::CHILDREN_SPAWNED);
                        event!(Level::DEBUG, event = guardian::SYSTEM_INITIALIZED);
                    }
                    Err(e) => {
                        event!(Level::ERROR, event = guardian::CHILDREN_SPAWN_FAILED, error = %e);
                        return Err(ActorProcessingErr::from(e));
                    }
                }
            }
            GuardianMessage::ResolveSession { entity_id, reply } => {
                let result = self.resolve_session(entity_id, state).await;
                let _ = reply.send(result);
            }
            GuardianMessage::HealthCheck { reply } => {
                let active_sessions = match &state.registry {
                    Some(registry) => {
                        match call(registry, |reply| RegistryMessage::ActiveSessions { reply }, Some(REGISTRY_CALL_TIMEOUT))
                            .await
                        {
                            Ok(CallResult::Success(count)) => count,
                            _ => 0
                        }
                    }
                    None => 0
                };

                let health = SystemHealth {
                    active_sessions,
                    uptime_seconds: state.startup_time.elapsed().as_secs()
                };
                event!(Level::DEBUG, event = guardian::HEALTH_CHECK_COMPLETED,
                       active_sessions = %health.active_sessions);
                let _ = reply.send(health);
            }
            GuardianMessage::Shutdown => {
                event!(Level::DEBUG, event = guardian::SYSTEM_SHUTDOWN_STARTED);

                if let Some(registry) = state.registry.take() {
                    registry.stop(None);
                }

                event!(Level::DEBUG, event = guardian::SYSTEM_SHUTDOWN_COMPLETED);
                myself.stop(None);
            }
        }
        Ok(())
    }
}

impl Guardian {
    async fn resolve_session(
        &self,
        entity_id: String,
        state: &GuardianState
    ) -> Result<ActorRef<SessionMessage>, CoachError> {
        let registry = state
            .registry
            .as_ref()
            .ok_or_else(|| CoachError::Generic("Actor system is not initialized".to_string()))?;

        let result = call(
            registry,
            |reply| RegistryMessage::Resolve { entity_id: entity_id.clone(), reply },
            Some(REGISTRY_CALL_TIMEOUT)
        )
        .await;

        match result {
            Ok(CallResult::Success(resolved)) => {
                event!(Level::DEBUG, event = guardian::SESSION_RESOLVED, entity_id = %entity_id);
                resolved
            }
            Ok(CallResult::Timeout) => {
                Err(CoachError::Timeout(format!("Session resolution timed out for {}", entity_id)))
            }
            Ok(CallResult::SenderError) | Err(_) => {
                Err(CoachError::Generic(format!("Session resolution failed for {}", entity_id)))
            }
        }
    }
}
