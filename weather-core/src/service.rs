//! Cache-through weather lookups.
//!
//! A lookup either hits the store and returns, or misses, fetches from the
//! provider, persists the result and returns. Persist failures are logged and
//! never fail the lookup. Records are written once and never expire.

use anyhow::Context;
use std::sync::Arc;

use crate::{
    config::Config,
    error::{WeatherError, WeatherResult},
    model::{RecordKey, WeatherQuery, WeatherRecord},
    rate_limit::RateLimiter,
    store::{WeatherStore, store_from_config},
    upstream::{OpenWeatherClient, UpstreamClient},
    validator::KeyValidator,
};

/// Where a description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Store,
    Upstream { persisted: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub description: String,
    pub source: LookupSource,
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    validator: Arc<KeyValidator>,
    limiter: Arc<RateLimiter>,
    store: Arc<dyn WeatherStore>,
    upstream: Arc<dyn UpstreamClient>,
}

impl WeatherService {
    pub fn new(
        validator: KeyValidator,
        limiter: Arc<RateLimiter>,
        store: Arc<dyn WeatherStore>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            limiter,
            store,
            upstream,
        }
    }

    /// Wire up the validator, limiter, store and OpenWeather client described by `config`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = store_from_config(&config.store)
            .await
            .context("Failed to open weather store")?;
        let upstream =
            OpenWeatherClient::new(&config.upstream).context("Failed to build upstream client")?;

        if config.api_keys.is_empty() {
            tracing::warn!("allow-list is empty; every request will be rejected");
        }

        Ok(Self::new(
            KeyValidator::new(config.allowed_keys().iter().cloned()),
            Arc::new(RateLimiter::from_config(&config.rate_limit)),
            store,
            Arc::new(upstream),
        ))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Full request path: key check, then quota, then cache-through lookup.
    ///
    /// Key and quota failures are raised before the provider is contacted.
    pub async fn get_weather_description(&self, query: &WeatherQuery) -> WeatherResult<String> {
        self.validator.validate(query.api_key.as_deref())?;

        let api_key = query
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherError::Internal("validated key vanished".into()))?;
        self.limiter.enforce(api_key)?;

        self.lookup(&query.city, query.country.as_deref(), api_key).await
    }

    pub async fn lookup(
        &self,
        city: &str,
        country: Option<&str>,
        api_key: &str,
    ) -> WeatherResult<String> {
        Ok(self.lookup_detailed(city, country, api_key).await?.description)
    }

    pub async fn lookup_detailed(
        &self,
        city: &str,
        country: Option<&str>,
        api_key: &str,
    ) -> WeatherResult<Lookup> {
        let key = RecordKey::new(city, country);

        match self.store.find_by_city_and_country(&key).await {
            Ok(Some(record)) => {
                tracing::debug!(%key, "weather cache hit");
                return Ok(Lookup {
                    description: record.description,
                    source: LookupSource::Store,
                });
            }
            Ok(None) => tracing::debug!(%key, "weather cache miss"),
            Err(e) => tracing::warn!(%key, error = %e, "store read failed; fetching upstream"),
        }

        let payload = self
            .upstream
            .fetch(&key.city, key.country.as_deref(), api_key)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    city = %key.city,
                    country = key.country.as_deref().unwrap_or_default(),
                    error = %e,
                    "upstream lookup failed"
                );
            })?;

        let description = payload.description();
        let persisted = self.persist(key, &description).await;

        Ok(Lookup {
            description,
            source: LookupSource::Upstream { persisted },
        })
    }

    async fn persist(&self, key: RecordKey, description: &str) -> bool {
        tracing::debug!(%key, description, "saving weather record");

        match self.store.save(WeatherRecord::new(key.clone(), description)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to save weather record");
                false
            }
        }
    }
}
