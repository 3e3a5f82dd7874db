//! Shared application context wiring configuration to adapters

use std::sync::Arc;

use crate::{
    adapter::{StoreBackend, StoreFactory, feed::SampleHeadlineFeed, invoker::{CannedInvoker, OpenAiInvoker}},
    config::{self, Config},
    domain::error::CoachError,
    port::{feed::HeadlineFeed, invoker::LlmInvoker, store::{CheckpointStore, StateStore}}
};

/// Dependencies shared by the actor system and the workflow runner
pub struct AppContext {
    pub config:      Config,
    pub state_store: Arc<dyn StateStore>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub invoker:     Arc<dyn LlmInvoker>,
    pub feed:        Arc<dyn HeadlineFeed>
}

impl AppContext {
    /// Build the context with durable RocksDB storage under the configured
    /// (or platform default) data directory
    pub fn init(config: Config) -> Result<Self, CoachError> {
        let path = match &config.storage.data_dir {
            Some(dir) => dir.clone(),
            None => config::get_data_dir().map_err(|e| CoachError::Configuration(e.to_string()))?
        };

        let (state_store, checkpoints) = StoreFactory::create(StoreBackend::RocksDb { path })?;
        Ok(Self::assemble(config, state_store, checkpoints))
    }

    /// Build the context with volatile in-memory storage
    pub fn in_memory(config: Config) -> Result<Self, CoachError> {
        let (state_store, checkpoints) = StoreFactory::create(StoreBackend::InMemory)?;
        Ok(Self::assemble(config, state_store, checkpoints))
    }

    fn assemble(
        config: Config,
        state_store: Arc<dyn StateStore>,
        checkpoints: Arc<dyn CheckpointStore>
    ) -> Self {
        let invoker: Arc<dyn LlmInvoker> = match &config.llm.base_url {
            Some(base_url) => {
                Arc::new(OpenAiInvoker::new(base_url.clone(), config.llm.model.clone(), config.llm.api_key.as_deref()))
            }
            None => Arc::new(CannedInvoker)
        };

        Self { config, state_store, checkpoints, invoker, feed: Arc::new(SampleHeadlineFeed::new()) }
    }
}
