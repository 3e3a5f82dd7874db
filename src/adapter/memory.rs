//! In-memory storage adapters
//!
//! HashMap-based implementations of the storage ports for development and
//! testing. Records are keyed exactly like the durable backends: session state
//! by entity id, checkpoints by (instance id, step name), instances by id.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    domain::{
        chat::SessionState,
        error::CoachError,
        workflow::{StepResult, WorkflowInstance}
    },
    port::store::{CheckpointStore, StateStore}
};

/// In-memory session state store
#[derive(Default)]
pub struct InMemoryStateStore {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load_state(&self, entity_id: &str) -> Result<Option<SessionState>, CoachError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(entity_id).cloned())
    }

    async fn save_state(&self, entity_id: &str, state: &SessionState) -> Result<(), CoachError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(entity_id.to_string(), state.clone());
        Ok(())
    }
}

/// In-memory checkpoint store
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    steps:     Arc<RwLock<HashMap<String, StepResult>>>,
    instances: Arc<RwLock<HashMap<String, WorkflowInstance>>>
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn step_key(instance_id: &str, step_name: &str) -> String {
        format!("{}:{}", instance_id, step_name)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get_step(&self, instance_id: &str, step_name: &str) -> Result<Option<StepResult>, CoachError> {
        let steps = self.steps.read().await;
        Ok(steps.get(&Self::step_key(instance_id, step_name)).cloned())
    }

    async fn put_step(&self, instance_id: &str, step_name: &str, result: &StepResult) -> Result<(), CoachError> {
        let mut steps = self.steps.write().await;
        steps.insert(Self::step_key(instance_id, step_name), result.clone());
        Ok(())
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Option<WorkflowInstance>, CoachError> {
        let instances = self.instances.read().await;
        Ok(instances.get(instance_id).cloned())
    }

    async fn put_instance(&self, instance: &WorkflowInstance) -> Result<(), CoachError> {
        let mut instances = self.instances.write().await;
        instances.insert(instance.instance_id.clone(), instance.clone());
        Ok(())
    }
}
