//! Step-checkpointed workflow engine and the briefing workflow built on it

pub mod briefing;
pub mod runner;
pub mod step;
