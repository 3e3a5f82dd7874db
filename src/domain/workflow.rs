//! Workflow instance and checkpoint record types
//!
//! A workflow instance is one execution run of a fixed ordered step list.
//! Status transitions are monotonic: `Running` moves to exactly one of
//! `Completed` or `Failed` and never back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle of a workflow instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

/// One execution run of the step list, tracked by id and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub instance_id: String,
    pub params:      Value,
    pub status:      WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output:      Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:       Option<String>,
    pub created_at:  DateTime<Utc>
}

impl WorkflowInstance {
    pub fn new(params: Value) -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            params,
            status: WorkflowStatus::Running,
            output: None,
            error: None,
            created_at: Utc::now()
        }
    }

    /// Terminal success transition; ignored if the instance is already terminal
    pub fn complete(&mut self, output: Value) {
        if self.status == WorkflowStatus::Running {
            self.status = WorkflowStatus::Completed;
            self.output = Some(output);
        }
    }

    /// Terminal failure transition; ignored if the instance is already terminal
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status == WorkflowStatus::Running {
            self.status = WorkflowStatus::Failed;
            self.error = Some(error.into());
        }
    }
}

/// Persisted checkpoint for one (instance, step) pair
///
/// Written once, immediately after the step body succeeds, and never mutated.
/// Its presence means the step body must not run again for that instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub output:       Value,
    pub completed_at: DateTime<Utc>,
    /// Execution attempts before success (1 when the first try succeeded)
    pub attempts:     u32
}

impl StepResult {
    pub fn new(output: Value, attempts: u32) -> Self {
        Self { output, completed_at: Utc::now(), attempts }
    }
}

/// Status view returned to callers of `status(instance_id)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStatus {
    pub instance_id: String,
    pub status:      WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output:      Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:       Option<String>
}

impl From<WorkflowInstance> for InstanceStatus {
    fn from(instance: WorkflowInstance) -> Self {
        Self {
            instance_id: instance.instance_id,
            status:      instance.status,
            output:      instance.output,
            error:       instance.error
        }
    }
}
