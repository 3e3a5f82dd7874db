//! Domain Events - Structured events for internal monitoring and debugging

/// Guardian Actor Events
pub mod guardian {
    pub const GUARDIAN_STARTED: &str = "guardian.started";
    pub const CHILDREN_SPAWNING: &str = "children.spawning";
    pub const CHILDREN_SPAWNED: &str = "children.spawned";
    pub const CHILDREN_SPAWN_FAILED: &str = "children.spawn_failed";
    pub const SYSTEM_INITIALIZED: &str = "system.initialized";
    pub const SYSTEM_SHUTDOWN_STARTED: &str = "system.shutdown_started";
    pub const SYSTEM_SHUTDOWN_COMPLETED: &str = "system.shutdown_completed";
    pub const HEALTH_CHECK_COMPLETED: &str = "health.check_completed";
    pub const SESSION_RESOLVED: &str = "session.resolved";
}

/// SessionRegistry Actor Events
pub mod registry {
    pub const REGISTRY_STARTED: &str = "registry.started";
    pub const SESSION_RESOLVED: &str = "session.resolved";
    pub const SESSION_SPAWNED: &str = "session.spawned";
    pub const SESSION_SPAWN_FAILED: &str = "session.spawn_failed";
}

/// Session Actor Events
pub mod session {
    pub const SESSION_STARTED: &str = "session.started";
    pub const STATE_LOADED: &str = "state.loaded";
    pub const STATE_FRESH: &str = "state.fresh";
    pub const STATE_PERSIST_FAILED: &str = "state.persist_failed";
    pub const MESSAGE_RECEIVED: &str = "message.received";
    pub const MESSAGE_ANSWERED: &str = "message.answered";
    pub const INFERENCE_FALLBACK: &str = "inference.fallback";
    pub const PROFILE_UPDATED: &str = "profile.updated";
    pub const BRIEFING_INJECTED: &str = "briefing.injected";
    pub const BRIEFING_DUPLICATE: &str = "briefing.duplicate";
    pub const HISTORY_CLEARED: &str = "history.cleared";
}

/// Workflow Runner Events
pub mod runner {
    pub const INSTANCE_CREATED: &str = "instance.created";
    pub const INSTANCE_RESUMED: &str = "instance.resumed";
    pub const INSTANCE_COMPLETED: &str = "instance.completed";
    pub const INSTANCE_FAILED: &str = "instance.failed";
    pub const STEP_SKIPPED: &str = "step.skipped";
    pub const STEP_STARTED: &str = "step.started";
    pub const STEP_COMPLETED: &str = "step.completed";
    pub const STEP_RETRYING: &str = "step.retrying";
    pub const STEP_FAILED: &str = "step.failed";
}
