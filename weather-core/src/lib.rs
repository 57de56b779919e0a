//! Core library for the `weather-proxy` service.
//!
//! This crate defines:
//! - Configuration loading and saving
//! - API key validation and per-key hourly rate limiting
//! - The SQLite-backed weather record store
//! - The upstream provider client
//! - The cache-through lookup service and its HTTP boundary
//!
//! It is used by `weather-proxy`, but can also be embedded in other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod rate_limit;
pub mod server;
pub mod service;
pub mod store;
pub mod upstream;
pub mod validator;

pub use config::{Config, RateLimitConfig, ServerConfig, StoreConfig, UpstreamConfig};
pub use error::{InvalidKeyReason, StoreError, UpstreamError, WeatherError, WeatherResult};
pub use model::{NO_DESCRIPTION, RecordKey, UpstreamWeather, WeatherQuery, WeatherRecord};
pub use rate_limit::{Clock, ManualClock, RateLimiter, RateWindow, SystemClock};
pub use service::{Lookup, LookupSource, WeatherService};
pub use store::{MemoryStore, SqliteStore, WeatherStore};
pub use upstream::{OpenWeatherClient, UpstreamClient};
pub use validator::KeyValidator;
