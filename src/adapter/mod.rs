//! Adapter implementations of the port traits - pluggable by configuration

pub mod feed;
pub mod invoker;
pub mod memory;
pub mod rocksdb;

use std::{path::PathBuf, sync::Arc};

use crate::{
    adapter::{
        memory::{InMemoryCheckpointStore, InMemoryStateStore},
        rocksdb::RocksDbStore
    },
    domain::error::CoachError,
    port::store::{CheckpointStore, StateStore}
};

/// Storage backend selection
pub enum StoreBackend {
    /// Volatile storage for development and testing
    InMemory,
    /// Durable storage surviving process restarts
    RocksDb { path: PathBuf }
}

pub struct StoreFactory;

impl StoreFactory {
    /// Create the state and checkpoint stores for the selected backend
    ///
    /// With RocksDB both ports share one database so the two kinds of durable
    /// state live side by side under the configured data directory.
    pub fn create(backend: StoreBackend) -> Result<(Arc<dyn StateStore>, Arc<dyn CheckpointStore>), CoachError> {
        match backend {
            StoreBackend::InMemory => {
                Ok((Arc::new(InMemoryStateStore::new()), Arc::new(InMemoryCheckpointStore::new())))
            }
            StoreBackend::RocksDb { path } => {
                let store = Arc::new(RocksDbStore::new(path)?);
                Ok((store.clone(), store))
            }
        }
    }
}
