//! Workflow step abstraction and retry policy

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::{config::RetryConfig, domain::error::CoachError};

/// Step failure classification driving the retry loop
#[derive(Debug, Error)]
pub enum StepError {
    /// Worth retrying with backoff (network, timeout, storage hiccup)
    #[error("{0}")]
    Transient(String),
    /// Retrying cannot help (bad params, missing entity); fails the instance
    #[error("{0}")]
    Permanent(String)
}

impl From<CoachError> for StepError {
    fn from(error: CoachError) -> Self {
        match error {
            CoachError::Validation(msg) | CoachError::NotFound(msg) => StepError::Permanent(msg),
            other => StepError::Transient(other.to_string())
        }
    }
}

/// Execution context handed to each step
///
/// Carries the instance params and the outputs of every earlier step, whether
/// freshly executed or replayed from a checkpoint. Steps read their inputs
/// from here only, so a resumed run sees the same values the original did.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub instance_id: String,
    pub params:      Value,
    completed:       HashMap<String, Value>
}

impl StepContext {
    pub fn new(instance_id: impl Into<String>, params: Value) -> Self {
        Self { instance_id: instance_id.into(), params, completed: HashMap::new() }
    }

    /// Record a completed step's output for later steps to read
    pub fn record(&mut self, step_name: &str, output: Value) {
        self.completed.insert(step_name.to_string(), output);
    }

    /// Output of an earlier step in this run
    pub fn output_of(&self, step_name: &str) -> Option<&Value> {
        self.completed.get(step_name)
    }
}

/// One named unit of work in a workflow
///
/// `run` must be side-effect safe under at-least-once execution: the runner
/// checkpoints after success, but a crash between the step body and the
/// checkpoint write means the body runs again on resume.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Stable name; checkpoints are keyed on it, so renaming a step orphans
    /// the checkpoints of in-flight instances
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &StepContext) -> Result<Value, StepError>;
}

/// Exponential backoff retry policy for transient step failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempt bound per step, including the first try
    pub max_attempts: u32,
    pub base_delay:   Duration
}

impl RetryPolicy {
    /// Delay before the given retry attempt (attempt 1 is the first retry)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self { max_attempts: config.max_attempts.max(1), base_delay: Duration::from_millis(config.base_delay_ms) }
    }
}
