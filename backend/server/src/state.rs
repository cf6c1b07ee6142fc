use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::{
    config::{Config, StoreBackend},
    database::{MemoryStore, RedisStore, TableStore},
    directory::Directory,
};

pub struct AppState {
    pub config: Config,
    pub directory: Directory,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>> {
        Self::from_config(Config::load()?).await
    }

    pub async fn from_config(config: Config) -> Result<Arc<Self>> {
        let store: Arc<dyn TableStore> = match config.store_backend {
            StoreBackend::Redis => {
                info!("Connecting to Redis table {}", config.table_key);
                Arc::new(
                    RedisStore::connect(&config.redis_url, &config.table_key)
                        .await
                        .with_context(|| format!("Failed to open table {}", config.table_key))?,
                )
            }
            StoreBackend::Memory => {
                info!("Using in-memory table, data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn TableStore>) -> Arc<Self> {
        let directory = Directory::new(store, config.lock_wait);

        Arc::new(Self { config, directory })
    }
}
