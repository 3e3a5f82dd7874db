//! LLM invoker implementations
//!
//! `OpenAiInvoker` talks to any OpenAI-compatible chat-completions endpoint.
//! `CannedInvoker` is the offline fallback used when no endpoint is
//! configured; it produces deterministic coaching text so the rest of the
//! engine stays exercisable without credentials.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{chat::Role, error::CoachError},
    port::invoker::{LlmInvoker, PromptMessage}
};

/// OpenAI-compatible chat-completions invoker
pub struct OpenAiInvoker {
    client:             reqwest::Client,
    base_url:           String,
    model:              String,
    /// Pre-computed `"Bearer <key>"` header value
    cached_auth_header: Option<String>
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model:       &'a str,
    messages:    &'a [PromptMessage],
    max_tokens:  u32,
    temperature: f32
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>
}

impl OpenAiInvoker {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            client:             reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url:           base_url.into(),
            model:              model.into(),
            cached_auth_header: api_key.map(|k| format!("Bearer {}", k))
        }
    }
}

#[async_trait]
impl LlmInvoker for OpenAiInvoker {
    async fn invoke(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
        temperature: f32
    ) -> Result<String, CoachError> {
        let request = ChatRequest { model: &self.model, messages, max_tokens, temperature };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut builder = self.client.post(&url).json(&request);
        if let Some(auth) = &self.cached_auth_header {
            builder = builder.header("Authorization", auth);
        }

        let response =
            builder.send().await.map_err(|e| CoachError::Inference(format!("Completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoachError::Inference(format!("Completion request returned {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoachError::Inference(format!("Failed to parse completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| CoachError::Inference("Completion response contained no text".to_string()))
    }
}

/// Deterministic offline invoker for development and demos
pub struct CannedInvoker;

#[async_trait]
impl LlmInvoker for CannedInvoker {
    async fn invoke(
        &self,
        messages: &[PromptMessage],
        _max_tokens: u32,
        _temperature: f32
    ) -> Result<String, CoachError> {
        let last_user = messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.as_str());

        Ok(match last_user {
            Some(text) => format!(
                "Here's a starting point on \"{}\": track every expense for a week, then set one concrete limit you \
                 can keep.",
                text
            ),
            None => "Keep it simple: spend less than you earn and automate the difference.".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_invoker_echoes_the_last_user_message() {
        let messages = vec![
            PromptMessage::new(Role::System, "coach"),
            PromptMessage::new(Role::User, "How do I budget?"),
            PromptMessage::new(Role::Assistant, "..."),
            PromptMessage::new(Role::User, "And debt?"),
        ];

        let reply = CannedInvoker.invoke(&messages, 256, 0.7).await.unwrap();
        assert!(reply.contains("And debt?"));
    }

    #[tokio::test]
    async fn canned_invoker_handles_empty_context() {
        let reply = CannedInvoker.invoke(&[], 256, 0.7).await.unwrap();
        assert!(!reply.is_empty());
    }
}
