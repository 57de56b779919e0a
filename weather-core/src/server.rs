//! HTTP boundary: `GET /api/weather?city=&country=&apiKey=`.
//!
//! Successful lookups answer with the plain-text description. Failures map to
//! fixed messages, except provider errors whose status and body are forwarded.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    error::{UpstreamError, WeatherError},
    model::WeatherQuery,
    service::WeatherService,
};

pub const INVALID_KEY_MESSAGE: &str =
    "Error: Invalid API key provided. Please check your API key and try again.";
pub const RATE_LIMIT_MESSAGE: &str = "Error: API rate limit exceeded. Please try again later.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error occurred.";
pub const MISSING_CITY_MESSAGE: &str = "City name is a required parameter";

const EVICTION_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

pub fn router(service: WeatherService) -> Router {
    Router::new()
        .route("/api/weather", get(get_weather))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn get_weather(
    State(service): State<WeatherService>,
    Query(params): Query<WeatherParams>,
) -> Response {
    let Some(city) = params.city.filter(|c| !c.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "Invalid query": MISSING_CITY_MESSAGE })),
        )
            .into_response();
    };

    let query = WeatherQuery::new(city, params.country, params.api_key);

    match service.get_weather_description(&query).await {
        Ok(description) => (StatusCode::OK, description).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        match self {
            WeatherError::InvalidKey(_) => {
                (StatusCode::UNAUTHORIZED, INVALID_KEY_MESSAGE).into_response()
            }
            WeatherError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response()
            }
            WeatherError::Upstream(UpstreamError::Status { status, body }) => {
                match StatusCode::from_u16(status) {
                    Ok(status) => {
                        let body = if body.is_empty() {
                            format!("Error: {}", status.canonical_reason().unwrap_or("Unknown"))
                        } else {
                            body
                        };
                        (status, body).into_response()
                    }
                    Err(_) => internal_error(),
                }
            }
            WeatherError::Upstream(_) | WeatherError::Internal(_) => internal_error(),
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
}

/// Serve until Ctrl-C, sweeping expired rate windows in the background.
pub async fn serve(listener: TcpListener, service: WeatherService) -> std::io::Result<()> {
    let limiter = service.limiter().clone();
    let sweeper = tokio::spawn(async move {
        let mut tick = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            tick.tick().await;
            let evicted = limiter.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "evicted expired rate windows");
            }
        }
    });

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "weather proxy listening");
    }

    let result = axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    tracing::info!("weather proxy stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
