use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    model::{RecordKey, WeatherRecord},
};

use super::WeatherStore;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordKey, WeatherRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn find_by_city_and_country(
        &self,
        key: &RecordKey,
    ) -> Result<Option<WeatherRecord>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn save(&self, record: WeatherRecord) -> Result<(), StoreError> {
        self.records.write().await.insert(record.key(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn country_variants_are_separate_records() {
        let store = MemoryStore::new();

        store
            .save(WeatherRecord::new(RecordKey::new("Springfield", None), "fog"))
            .await
            .unwrap();
        store
            .save(WeatherRecord::new(RecordKey::new("Springfield", Some("us")), "clear sky"))
            .await
            .unwrap();

        let bare = store
            .find_by_city_and_country(&RecordKey::new("Springfield", Some("")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bare.description, "fog");

        let us = store
            .find_by_city_and_country(&RecordKey::new("Springfield", Some("us")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(us.description, "clear sky");

        assert!(
            store
                .find_by_city_and_country(&RecordKey::new("Springfield", Some("ca")))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryStore::new();
        let key = RecordKey::new("Lima", Some("pe"));

        store.save(WeatherRecord::new(key.clone(), "haze")).await.unwrap();
        store.save(WeatherRecord::new(key.clone(), "drizzle")).await.unwrap();

        let found = store.find_by_city_and_country(&key).await.unwrap().unwrap();
        assert_eq!(found.description, "drizzle");
        assert_eq!(store.len().await, 1);
    }
}
