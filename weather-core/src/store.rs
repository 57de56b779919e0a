use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    config::StoreConfig,
    error::StoreError,
    model::{RecordKey, WeatherRecord},
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable mapping from (city, country) to a weather description.
#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    async fn find_by_city_and_country(
        &self,
        key: &RecordKey,
    ) -> Result<Option<WeatherRecord>, StoreError>;

    /// Persist `record`, replacing any record with the same key.
    async fn save(&self, record: WeatherRecord) -> Result<(), StoreError>;
}

/// Open the store described by config: file-backed when a path is set, in-memory otherwise.
pub async fn store_from_config(config: &StoreConfig) -> Result<Arc<dyn WeatherStore>, StoreError> {
    let store: Arc<dyn WeatherStore> = match &config.path {
        Some(path) => Arc::new(SqliteStore::open(path.clone()).await?),
        None => Arc::new(MemoryStore::new()),
    };

    Ok(store)
}
