//! Built-in headline feed
//!
//! A stand-in for any idempotent external fetch (real news retrieval is a
//! non-goal). Returns the same candidate pool on every call, which keeps the
//! fetch step safe to retry freely.

use async_trait::async_trait;

use crate::{
    domain::error::CoachError,
    port::feed::{Headline, HeadlineFeed}
};

/// Static candidate pool served as the external dataset
pub struct SampleHeadlineFeed;

impl SampleHeadlineFeed {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SampleHeadlineFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HeadlineFeed for SampleHeadlineFeed {
    async fn fetch(&self) -> Result<Vec<Headline>, CoachError> {
        Ok(vec![
            Headline {
                title:   "Central bank holds rates steady".to_string(),
                source:  "Wire Desk".to_string(),
                summary: "Policymakers kept the benchmark rate unchanged, citing cooling inflation and a stable \
                          labor market."
                    .to_string()
            },
            Headline {
                title:   "Grocery prices dip for the third straight month".to_string(),
                source:  "Market Watchers".to_string(),
                summary: "Staples such as eggs and produce fell again, giving household budgets modest relief."
                    .to_string()
            },
            Headline {
                title:   "Credit card balances hit a record high".to_string(),
                source:  "Finance Daily".to_string(),
                summary: "Revolving debt climbed as households leaned on cards; average APRs remain above twenty \
                          percent."
                    .to_string()
            },
            Headline {
                title:   "Savings account yields finally beat inflation".to_string(),
                source:  "Rate Tracker".to_string(),
                summary: "High-yield accounts now outpace price growth for the first time in two years."
                    .to_string()
            },
        ])
    }
}
