//! Actor system for the coaching engine
//!
//! Hierarchy:
//! - `Guardian` - root supervisor, fronts the system
//! - `SessionRegistry` - get-or-spawn routing from entity id to session actor
//! - `SessionActor` - one per entity id, owns that id's durable state
//!
//! `SessionClient` is the typed facade callers use instead of raw messages.

pub mod client;
pub mod guardian;
pub mod message;
pub mod registry;
pub mod session;

pub use client::*;
pub use guardian::*;
pub use message::*;
pub use registry::*;
pub use session::*;
