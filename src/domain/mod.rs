//! Core domain types for the coaching engine

pub mod chat;
pub mod constant;
pub mod error;
pub mod profile;
pub mod workflow;
