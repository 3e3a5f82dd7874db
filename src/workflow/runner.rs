//! Workflow runner - executes a fixed step list with durable checkpoints
//!
//! Execution contract:
//! - Steps run strictly in order; a step starts only after every earlier one
//!   has a checkpoint
//! - Each step's output is checkpointed before the next step starts
//! - On resume, checkpointed steps are skipped and their recorded outputs are
//!   replayed into the context instead of re-executing the body
//! - Transient failures retry with exponential backoff up to the attempt
//!   bound; permanent failures and exhausted retries fail the instance,
//!   keeping the checkpoints of the steps that already succeeded

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{Level, event};

use crate::{
    domain::{
        constant::runner,
        error::CoachError,
        workflow::{InstanceStatus, StepResult, WorkflowInstance},
    },
    port::store::CheckpointStore,
    workflow::step::{RetryPolicy, StepContext, StepError, WorkflowStep}
};

#[derive(Clone)]
pub struct WorkflowRunner {
    checkpoints: Arc<dyn CheckpointStore>,
    steps:       Arc<Vec<Arc<dyn WorkflowStep>>>,
    retry:       RetryPolicy
}

impl WorkflowRunner {
    pub fn new(
        checkpoints: Arc<dyn CheckpointStore>,
        steps: Vec<Arc<dyn WorkflowStep>>,
        retry: RetryPolicy
    ) -> Self {
        Self { checkpoints, steps: Arc::new(steps), retry }
    }

    /// Persist a new running instance and start executing it in the
    /// background, returning the instance id immediately
    pub async fn create(&self, params: Value) -> Result<String, CoachError> {
        let instance = WorkflowInstance::new(params);
        let instance_id = instance.instance_id.clone();
        self.checkpoints.put_instance(&instance).await?;

        event!(Level::DEBUG, event = runner::INSTANCE_CREATED, instance_id = %instance_id);

        let runner = self.clone();
        tokio::spawn(async move {
            runner.execute(instance).await;
        });

        Ok(instance_id)
    }

    /// Re-drive a known instance from its checkpoints
    ///
    /// Terminal instances are left untouched. For a running instance every
    /// checkpointed step is skipped and execution picks up at the first step
    /// without one.
    pub async fn resume(&self, instance_id: &str) -> Result<InstanceStatus, CoachError> {
        let instance = self
            .checkpoints
            .get_instance(instance_id)
            .await?
            .ok_or_else(|| CoachError::NotFound(format!("Unknown workflow instance: {}", instance_id)))?;

        if instance.status.is_terminal() {
            return Ok(instance.into());
        }

        event!(Level::DEBUG, event = runner::INSTANCE_RESUMED, instance_id = %instance_id);

        let instance = self.execute(instance).await;
        Ok(instance.into())
    }

    /// Current status of an instance
    pub async fn status(&self, instance_id: &str) -> Result<InstanceStatus, CoachError> {
        let instance = self
            .checkpoints
            .get_instance(instance_id)
            .await?
            .ok_or_else(|| CoachError::NotFound(format!("Unknown workflow instance: {}", instance_id)))?;
        Ok(instance.into())
    }

    /// Walk the step list to a terminal status and persist it
    async fn execute(&self, mut instance: WorkflowInstance) -> WorkflowInstance {
        let mut ctx = StepContext::new(instance.instance_id.clone(), instance.params.clone());
        let mut step_names = Vec::with_capacity(self.steps.len());

        for step in self.steps.iter() {
            step_names.push(step.name());
            if let Err(error) = self.run_step(step.as_ref(), &mut ctx).await {
                event!(Level::WARN, event = runner::INSTANCE_FAILED,
                       instance_id = %instance.instance_id, step = step.name(), error = %error);
                instance.fail(error.to_string());
                self.persist_instance(&instance).await;
                return instance;
            }
        }

        let output = json!({
            "steps": step_names,
            "lastOutput": step_names.last().and_then(|name| ctx.output_of(name)).cloned()
        });
        instance.complete(output);
        self.persist_instance(&instance).await;

        event!(Level::DEBUG, event = runner::INSTANCE_COMPLETED, instance_id = %instance.instance_id);

        instance
    }

    /// Run one step to a checkpoint, or replay its existing one
    async fn run_step(&self, step: &dyn WorkflowStep, ctx: &mut StepContext) -> Result<(), CoachError> {
        if let Some(existing) = self.checkpoints.get_step(&ctx.instance_id, step.name()).await? {
            event!(Level::DEBUG, event = runner::STEP_SKIPPED,
                   instance_id = %ctx.instance_id, step = step.name());
            ctx.record(step.name(), existing.output);
            return Ok(());
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            event!(Level::DEBUG, event = runner::STEP_STARTED,
                   instance_id = %ctx.instance_id, step = step.name(), attempt = %attempt);

            match step.run(ctx).await {
                Ok(output) => {
                    // The checkpoint must be durable before the next step may
                    // observe this one as done
                    let result = StepResult::new(output.clone(), attempt);
                    self.checkpoints.put_step(&ctx.instance_id, step.name(), &result).await?;
                    ctx.record(step.name(), output);

                    event!(Level::DEBUG, event = runner::STEP_COMPLETED,
                           instance_id = %ctx.instance_id, step = step.name(), attempts = %attempt);
                    return Ok(());
                }
                Err(StepError::Permanent(msg)) => {
                    event!(Level::WARN, event = runner::STEP_FAILED,
                           instance_id = %ctx.instance_id, step = step.name(), error = %msg);
                    return Err(CoachError::Step(format!("Step {} failed: {}", step.name(), msg)));
                }
                Err(StepError::Transient(msg)) => {
                    if attempt >= self.retry.max_attempts {
                        event!(Level::WARN, event = runner::STEP_FAILED,
                               instance_id = %ctx.instance_id, step = step.name(),
                               attempts = %attempt, error = %msg);
                        return Err(CoachError::Step(format!(
                            "Step {} exhausted {} attempts: {}",
                            step.name(),
                            attempt,
                            msg
                        )));
                    }

                    let delay = self.retry.backoff(attempt);
                    event!(Level::DEBUG, event = runner::STEP_RETRYING,
                           instance_id = %ctx.instance_id, step = step.name(),
                           attempt = %attempt, delay_ms = %delay.as_millis(), error = %msg);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn persist_instance(&self, instance: &WorkflowInstance) {
        // A terminal status we cannot persist is still a terminal run; the
        // next resume re-derives it from the checkpoints
        if let Err(e) = self.checkpoints.put_instance(instance).await {
            event!(Level::ERROR, event = runner::INSTANCE_FAILED,
                   instance_id = %instance.instance_id, error = %e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        adapter::memory::InMemoryCheckpointStore,
        domain::workflow::WorkflowStatus
    };

    /// Step that counts executions and fails the first `fail_first` attempts
    struct CountingStep {
        step_name:  &'static str,
        executions: Arc<AtomicU32>,
        fail_first: u32
    }

    impl CountingStep {
        fn new(step_name: &'static str) -> (Arc<Self>, Arc<AtomicU32>) {
            Self::failing(step_name, 0)
        }

        fn failing(step_name: &'static str, fail_first: u32) -> (Arc<Self>, Arc<AtomicU32>) {
            let executions = Arc::new(AtomicU32::new(0));
            (Arc::new(Self { step_name, executions: executions.clone(), fail_first }), executions)
        }
    }

    #[async_trait]
    impl WorkflowStep for CountingStep {
        fn name(&self) -> &'static str {
            self.step_name
        }

        async fn run(&self, _ctx: &StepContext) -> Result<Value, StepError> {
            let execution = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
            if execution <= self.fail_first {
                return Err(StepError::Transient(format!("induced failure {}", execution)));
            }
            Ok(json!({"step": self.step_name, "execution": execution}))
        }
    }

    /// Step that always fails permanently
    struct PermanentFailure;

    #[async_trait]
    impl WorkflowStep for PermanentFailure {
        fn name(&self) -> &'static str {
            "permanent"
        }

        async fn run(&self, _ctx: &StepContext) -> Result<Value, StepError> {
            Err(StepError::Permanent("bad params".to_string()))
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, base_delay: Duration::from_millis(1) }
    }

    async fn wait_terminal(runner: &WorkflowRunner, instance_id: &str) -> InstanceStatus {
        for _ in 0..100 {
            let status = runner.status(instance_id).await.unwrap();
            if status.status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("instance {} never reached a terminal status", instance_id);
    }

    #[tokio::test]
    async fn runs_all_steps_in_order_and_completes() {
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let (first, first_count) = CountingStep::new("first");
        let (second, second_count) = CountingStep::new("second");
        let runner = WorkflowRunner::new(checkpoints.clone(), vec![first, second], fast_retry(3));

        let instance_id = runner.create(json!({})).await.unwrap();
        let status = wait_terminal(&runner, &instance_id).await;

        assert_eq!(status.status, WorkflowStatus::Completed);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);

        let checkpoint = checkpoints.get_step(&instance_id, "first").await.unwrap().unwrap();
        assert_eq!(checkpoint.attempts, 1);
        assert_eq!(checkpoint.output["step"], "first");
    }

    #[tokio::test]
    async fn resume_skips_checkpointed_steps() {
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let (first, first_count) = CountingStep::new("first");
        let (second, second_count) = CountingStep::new("second");
        let (third, third_count) = CountingStep::new("third");
        let runner =
            WorkflowRunner::new(checkpoints.clone(), vec![first, second, third], fast_retry(3));

        // Simulate a run that checkpointed two steps and then crashed
        let instance = WorkflowInstance::new(json!({}));
        let instance_id = instance.instance_id.clone();
        checkpoints.put_instance(&instance).await.unwrap();
        checkpoints.put_step(&instance_id, "first", &StepResult::new(json!({"step": "first"}), 1)).await.unwrap();
        checkpoints.put_step(&instance_id, "second", &StepResult::new(json!({"step": "second"}), 2)).await.unwrap();

        let status = runner.resume(&instance_id).await.unwrap();

        assert_eq!(status.status, WorkflowStatus::Completed);
        // Only the step without a checkpoint executed
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 0);
        assert_eq!(third_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resume_of_a_terminal_instance_is_a_no_op() {
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let (first, first_count) = CountingStep::new("first");
        let runner = WorkflowRunner::new(checkpoints.clone(), vec![first], fast_retry(3));

        let instance_id = runner.create(json!({})).await.unwrap();
        wait_terminal(&runner, &instance_id).await;

        let status = runner.resume(&instance_id).await.unwrap();
        assert_eq!(status.status, WorkflowStatus::Completed);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_retry_and_record_attempts() {
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let (flaky, count) = CountingStep::failing("flaky", 2);
        let runner = WorkflowRunner::new(checkpoints.clone(), vec![flaky], fast_retry(3));

        let instance_id = runner.create(json!({})).await.unwrap();
        let status = wait_terminal(&runner, &instance_id).await;

        assert_eq!(status.status, WorkflowStatus::Completed);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        let checkpoint = checkpoints.get_step(&instance_id, "flaky").await.unwrap().unwrap();
        assert_eq!(checkpoint.attempts, 3);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_the_instance_and_keep_earlier_checkpoints() {
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let (first, _) = CountingStep::new("first");
        let (broken, _) = CountingStep::failing("broken", 10);
        let (last, last_count) = CountingStep::new("last");
        let runner = WorkflowRunner::new(checkpoints.clone(), vec![first, broken, last], fast_retry(2));

        let instance_id = runner.create(json!({})).await.unwrap();
        let status = wait_terminal(&runner, &instance_id).await;

        assert_eq!(status.status, WorkflowStatus::Failed);
        assert!(status.error.unwrap().contains("exhausted"));

        // Later steps never ran; the earlier checkpoint survives for resume
        assert_eq!(last_count.load(Ordering::SeqCst), 0);
        assert!(checkpoints.get_step(&instance_id, "first").await.unwrap().is_some());
        assert!(checkpoints.get_step(&instance_id, "broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn permanent_failure_fails_without_retrying() {
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let runner = WorkflowRunner::new(checkpoints, vec![Arc::new(PermanentFailure)], fast_retry(5));

        let instance_id = runner.create(json!({})).await.unwrap();
        let status = wait_terminal(&runner, &instance_id).await;

        assert_eq!(status.status, WorkflowStatus::Failed);
        assert!(status.error.unwrap().contains("bad params"));
    }

    #[tokio::test]
    async fn unknown_instance_ids_are_not_found() {
        let runner = WorkflowRunner::new(Arc::new(InMemoryCheckpointStore::new()), vec![], fast_retry(3));

        assert!(matches!(runner.status("missing").await, Err(CoachError::NotFound(_))));
        assert!(matches!(runner.resume("missing").await, Err(CoachError::NotFound(_))));
    }
}
