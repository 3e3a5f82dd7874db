use thiserror::Error;

/// Common error types for the coaching engine
#[derive(Error, Debug, Clone)]
pub enum CoachError {
    /// Malformed caller input - rejected before any state mutation
    #[error("{0}")]
    Validation(String),

    /// Durable read/write failure - the operation aborts with no partial persist
    #[error("{0}")]
    Storage(String),

    /// LLM call failure
    #[error("{0}")]
    Inference(String),

    /// LLM call exceeded its bounded timeout
    #[error("{0}")]
    Timeout(String),

    /// Unknown workflow instance id
    #[error("{0}")]
    NotFound(String),

    /// Configuration related errors
    #[error("{0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("{0}")]
    Serialization(String),

    /// Actor spawn errors
    #[error("{0}")]
    Spawn(String),

    /// Workflow step failure after retries were exhausted
    #[error("{0}")]
    Step(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String)
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for CoachError {
    fn from(err: anyhow::Error) -> Self {
        CoachError::Generic(err.to_string())
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CoachError {
    fn from(err: std::io::Error) -> Self {
        CoachError::Storage(err.to_string())
    }
}

/// Convert from serde_json::Error
impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        CoachError::Serialization(err.to_string())
    }
}

/// Convert from serde_yaml::Error
impl From<serde_yaml::Error> for CoachError {
    fn from(err: serde_yaml::Error) -> Self {
        CoachError::Serialization(err.to_string())
    }
}

/// Convert from ractor::SpawnErr
impl From<ractor::SpawnErr> for CoachError {
    fn from(err: ractor::SpawnErr) -> Self {
        CoachError::Spawn(err.to_string())
    }
}
