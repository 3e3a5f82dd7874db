//! fincoach - a durable personal budgeting coach
//!
//! Two cooperating halves:
//! - An actor system where each entity id owns one session actor holding its
//!   chat history and financial profile, persisted through a state store
//! - A checkpointed workflow runner that drives the daily briefing pipeline
//!   and can resume an interrupted run without repeating completed steps

pub mod actor;
pub mod adapter;
pub mod config;
pub mod context;
pub mod domain;
pub mod port;
pub mod workflow;

pub use config::Config;
pub use context::AppContext;
pub use domain::error::CoachError;
