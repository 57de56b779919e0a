use async_trait::async_trait;
use reqwest::Client;

use crate::{config::UpstreamConfig, error::UpstreamError, model::UpstreamWeather};

use super::{UpstreamClient, location_query};

/// Client for the OpenWeather current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.response_timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            http,
        })
    }
}

#[async_trait]
impl UpstreamClient for OpenWeatherClient {
    async fn fetch(
        &self,
        city: &str,
        country: Option<&str>,
        api_key: &str,
    ) -> Result<UpstreamWeather, UpstreamError> {
        let q = location_query(city, country);

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", q.as_str()), ("appid", api_key)])
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(format!("failed to send request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::error!(
                city,
                country = country.unwrap_or_default(),
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }

        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
