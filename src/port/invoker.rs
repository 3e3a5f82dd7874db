//! Text-generation abstraction
//!
//! The engine consumes the LLM as an opaque call: an ordered list of
//! role/content pairs plus generation parameters in, generated text out.
//! Callers own the timeout and the failure policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{chat::Role, error::CoachError};

/// One entry of the generation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role:    Role,
    pub content: String
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// Opaque text-generation call
#[async_trait]
pub trait LlmInvoker: Send + Sync {
    /// Generate a completion for the given context, or fail with
    /// `CoachError::Inference`
    async fn invoke(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
        temperature: f32
    ) -> Result<String, CoachError>;
}
