//! Daily briefing workflow
//!
//! Three steps against one entity's session:
//! 1. `fetch_headlines` - pull the candidate pool and pick one at random; the
//!    pick lands in the checkpoint, so a resumed run delivers the same
//!    headline the original chose
//! 2. `compose_briefing` - turn the picked headline into two sentences of
//!    budget-minded coaching text via the invoker
//! 3. `deliver_briefing` - inject the text into the session, keyed by the
//!    instance id so a retried delivery appends at most once

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppContext,
    actor::client::SessionClient,
    config::LlmConfig,
    domain::{chat::Role, error::CoachError},
    port::{
        feed::{Headline, HeadlineFeed},
        invoker::{LlmInvoker, PromptMessage}
    },
    workflow::step::{StepContext, StepError, WorkflowStep}
};

pub const STEP_FETCH: &str = "fetch_headlines";
pub const STEP_COMPOSE: &str = "compose_briefing";
pub const STEP_DELIVER: &str = "deliver_briefing";

/// Parameters of one briefing run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefingParams {
    pub entity_id: String
}

/// The full briefing step list wired to the shared context
pub fn briefing_steps(app_context: &AppContext, sessions: SessionClient) -> Vec<Arc<dyn WorkflowStep>> {
    vec![
        Arc::new(FetchHeadlinesStep { feed: app_context.feed.clone() }),
        Arc::new(ComposeBriefingStep { invoker: app_context.invoker.clone(), llm: app_context.config.llm.clone() }),
        Arc::new(DeliverBriefingStep { sessions }),
    ]
}

/// Fetch the candidate pool and checkpoint a random pick
pub struct FetchHeadlinesStep {
    feed: Arc<dyn HeadlineFeed>
}

#[async_trait]
impl WorkflowStep for FetchHeadlinesStep {
    fn name(&self) -> &'static str {
        STEP_FETCH
    }

    async fn run(&self, _ctx: &StepContext) -> Result<Value, StepError> {
        let pool = self.feed.fetch().await.map_err(|e| StepError::Transient(e.to_string()))?;
        if pool.is_empty() {
            return Err(StepError::Permanent("Headline feed returned no candidates".to_string()));
        }

        let pick = rand::rng().random_range(0..pool.len());
        let headline = &pool[pick];

        Ok(json!({
            "headline": headline,
            "poolSize": pool.len()
        }))
    }
}

/// Compose coaching text for the picked headline
pub struct ComposeBriefingStep {
    invoker: Arc<dyn LlmInvoker>,
    llm:     LlmConfig
}

#[async_trait]
impl WorkflowStep for ComposeBriefingStep {
    fn name(&self) -> &'static str {
        STEP_COMPOSE
    }

    async fn run(&self, ctx: &StepContext) -> Result<Value, StepError> {
        let fetched = ctx
            .output_of(STEP_FETCH)
            .ok_or_else(|| StepError::Permanent(format!("Missing output of step {}", STEP_FETCH)))?;
        let headline: Headline = serde_json::from_value(fetched["headline"].clone())
            .map_err(|e| StepError::Permanent(format!("Malformed {} output: {}", STEP_FETCH, e)))?;

        let prompt = vec![
            PromptMessage::new(
                Role::System,
                "You are a personal budgeting coach. In two short sentences, tell the user what this news means \
                 for their personal finances and one concrete action to take."
            ),
            PromptMessage::new(
                Role::User,
                format!("{} ({}): {}", headline.title, headline.source, headline.summary)
            ),
        ];

        let briefing = tokio::time::timeout(
            self.llm.timeout(),
            self.invoker.invoke(&prompt, self.llm.max_tokens, self.llm.temperature)
        )
        .await
        .map_err(|_| StepError::Transient(format!("Composition timed out after {}s", self.llm.timeout_secs)))?
        .map_err(|e| StepError::Transient(e.to_string()))?;

        Ok(json!({
            "briefing": briefing,
            "headline": headline.title
        }))
    }
}

/// Inject the composed text into the entity's session
pub struct DeliverBriefingStep {
    sessions: SessionClient
}

#[async_trait]
impl WorkflowStep for DeliverBriefingStep {
    fn name(&self) -> &'static str {
        STEP_DELIVER
    }

    async fn run(&self, ctx: &StepContext) -> Result<Value, StepError> {
        let params: BriefingParams = serde_json::from_value(ctx.params.clone())
            .map_err(|e| StepError::Permanent(format!("Invalid briefing params: {}", e)))?;

        let composed = ctx
            .output_of(STEP_COMPOSE)
            .ok_or_else(|| StepError::Permanent(format!("Missing output of step {}", STEP_COMPOSE)))?;
        let briefing = composed["briefing"]
            .as_str()
            .ok_or_else(|| StepError::Permanent(format!("Malformed {} output", STEP_COMPOSE)))?;

        // The instance id is the idempotency key, so the crash window between
        // injection and this step's checkpoint cannot double-deliver
        match self.sessions.inject_briefing(&params.entity_id, briefing, ctx.instance_id.as_str()).await {
            Ok(()) => Ok(json!({
                "entityId": params.entity_id,
                "delivered": true
            })),
            Err(CoachError::Validation(msg)) => Err(StepError::Permanent(msg)),
            Err(other) => Err(StepError::Transient(other.to_string()))
        }
    }
}
