//! Storage abstractions for durable session state and workflow checkpoints
//!
//! Each unit of durable state (one session record, one step checkpoint, one
//! instance record) is written atomically and independently; no cross-record
//! transactions are needed.

use async_trait::async_trait;

use crate::domain::{
    chat::SessionState,
    error::CoachError,
    workflow::{StepResult, WorkflowInstance}
};

/// Persistence for per-entity session state (the persistence id is the entity id)
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state for an entity, `None` when the id is new
    async fn load_state(&self, entity_id: &str) -> Result<Option<SessionState>, CoachError>;

    /// Persist the full state snapshot for an entity
    async fn save_state(&self, entity_id: &str, state: &SessionState) -> Result<(), CoachError>;
}

/// Persistence for workflow instances and their per-step checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Look up the checkpoint for a (instance, step) pair
    async fn get_step(&self, instance_id: &str, step_name: &str) -> Result<Option<StepResult>, CoachError>;

    /// Record a step checkpoint; called exactly once per (instance, step)
    async fn put_step(&self, instance_id: &str, step_name: &str, result: &StepResult) -> Result<(), CoachError>;

    /// Load an instance record by id
    async fn get_instance(&self, instance_id: &str) -> Result<Option<WorkflowInstance>, CoachError>;

    /// Persist an instance record (creation and status transitions)
    async fn put_instance(&self, instance: &WorkflowInstance) -> Result<(), CoachError>;
}
