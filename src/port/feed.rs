//! External dataset abstraction for the briefing workflow
//!
//! The fetch is an idempotent read and safe to retry freely; any selection
//! among the returned candidates happens in the workflow step and is captured
//! in its checkpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::CoachError;

/// One candidate item from the external dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub title:   String,
    pub source:  String,
    pub summary: String
}

/// Idempotent headline fetch
#[async_trait]
pub trait HeadlineFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Headline>, CoachError>;
}
