//! RocksDB implementation of the storage ports
//!
//! A single database with one column family per record type: session state,
//! step checkpoints, and instance records. Values are JSON; step checkpoints
//! are keyed `instance_id:step_name`.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use rocksdb::{ColumnFamily, DB, Options};

use crate::{
    domain::{
        chat::SessionState,
        error::CoachError,
        workflow::{StepResult, WorkflowInstance}
    },
    port::store::{CheckpointStore, StateStore}
};

/// Column family names for different record types
const CF_SESSIONS: &str = "sessions";
const CF_STEPS: &str = "steps";
const CF_INSTANCES: &str = "instances";

/// RocksDB-backed durable store implementing both storage ports
pub struct RocksDbStore {
    db: Arc<DB>
}

impl RocksDbStore {
    /// Open (or create) the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoachError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let cf_names = vec![CF_SESSIONS, CF_STEPS, CF_INSTANCES];

        let db = DB::open_cf(&opts, path, &cf_names)
            .map_err(|e| CoachError::Configuration(format!("Failed to open RocksDB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get column family handle
    fn get_cf(&self, name: &str) -> Result<&ColumnFamily, CoachError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| CoachError::Configuration(format!("Column family '{}' not found", name)))
    }

    /// Generate checkpoint key for storage
    fn step_key(instance_id: &str, step_name: &str) -> String {
        format!("{}:{}", instance_id, step_name)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, cf: &str, key: &str) -> Result<Option<T>, CoachError> {
        let handle = self.get_cf(cf)?;

        if let Some(data) = self
            .db
            .get_cf(handle, key)
            .map_err(|e| CoachError::Storage(format!("Failed to read '{}': {}", key, e)))?
        {
            let value = serde_json::from_slice(&data)
                .map_err(|e| CoachError::Serialization(format!("Failed to deserialize '{}': {}", key, e)))?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    fn write_json<T: serde::Serialize>(&self, cf: &str, key: &str, value: &T) -> Result<(), CoachError> {
        let handle = self.get_cf(cf)?;

        let data = serde_json::to_vec(value).map_err(|e| CoachError::Serialization(e.to_string()))?;

        self.db
            .put_cf(handle, key, &data)
            .map_err(|e| CoachError::Storage(format!("Failed to write '{}': {}", key, e)))?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for RocksDbStore {
    async fn load_state(&self, entity_id: &str) -> Result<Option<SessionState>, CoachError> {
        self.read_json(CF_SESSIONS, entity_id)
    }

    async fn save_state(&self, entity_id: &str, state: &SessionState) -> Result<(), CoachError> {
        self.write_json(CF_SESSIONS, entity_id, state)
    }
}

#[async_trait]
impl CheckpointStore for RocksDbStore {
    async fn get_step(&self, instance_id: &str, step_name: &str) -> Result<Option<StepResult>, CoachError> {
        self.read_json(CF_STEPS, &Self::step_key(instance_id, step_name))
    }

    async fn put_step(&self, instance_id: &str, step_name: &str, result: &StepResult) -> Result<(), CoachError> {
        self.write_json(CF_STEPS, &Self::step_key(instance_id, step_name), result)
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Option<WorkflowInstance>, CoachError> {
        self.read_json(CF_INSTANCES, instance_id)
    }

    async fn put_instance(&self, instance: &WorkflowInstance) -> Result<(), CoachError> {
        self.write_json(CF_INSTANCES, &instance.instance_id, instance)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::chat::ChatMessage;

    #[tokio::test]
    async fn session_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut state = SessionState::default();
        state.history.push(ChatMessage::user("hello"));
        state.history.push(ChatMessage::assistant("hi"));

        {
            let store = RocksDbStore::new(dir.path()).unwrap();
            store.save_state("u1", &state).await.unwrap();
        }

        // Fresh handle simulates a process restart
        let store = RocksDbStore::new(dir.path()).unwrap();
        let loaded = store.load_state("u1").await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert!(store.load_state("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn checkpoints_and_instances_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::new(dir.path()).unwrap();

        let result = StepResult::new(json!({"headline": "markets up"}), 2);
        store.put_step("wf-1", "fetch_headlines", &result).await.unwrap();

        let loaded = store.get_step("wf-1", "fetch_headlines").await.unwrap().unwrap();
        assert_eq!(loaded, result);
        assert_eq!(loaded.attempts, 2);
        assert!(store.get_step("wf-1", "compose_briefing").await.unwrap().is_none());

        let instance = WorkflowInstance::new(json!({"entityId": "u1"}));
        store.put_instance(&instance).await.unwrap();
        let loaded = store.get_instance(&instance.instance_id).await.unwrap().unwrap();
        assert_eq!(loaded, instance);
        assert!(store.get_instance("missing").await.unwrap().is_none());
    }
}
