use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::UpstreamError, model::UpstreamWeather};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Fetches current weather for a location using the caller's credential.
#[async_trait]
pub trait UpstreamClient: Send + Sync + Debug {
    async fn fetch(
        &self,
        city: &str,
        country: Option<&str>,
        api_key: &str,
    ) -> Result<UpstreamWeather, UpstreamError>;
}

/// Value of the provider's `q` parameter.
pub fn location_query(city: &str, country: Option<&str>) -> String {
    match country.filter(|c| !c.is_empty()) {
        Some(country) => format!("{city},{country}"),
        None => city.to_string(),
    }
}
