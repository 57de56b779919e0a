//! Per-key fixed-window rate limiting.
//!
//! Each API key owns one [`RateWindow`]. A window opens on the key's first
//! request and lasts `window`; the first request at or past its end resets the
//! count and opens a new window. Rejected requests still consume a slot.
//!
//! Windows live in a sharded [`DashMap`], so updates to one key are serialized
//! by its entry guard while other keys proceed independently.

use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    config::RateLimitConfig,
    error::{WeatherError, WeatherResult},
};

/// Source of the current time.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Request count for one key within `[window_start, window_start + window)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl RateWindow {
    fn open(now: DateTime<Utc>) -> Self {
        Self { count: 0, window_start: now }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    quota: u32,
    window: TimeDelta,
    clock: Arc<dyn Clock>,
    windows: DashMap<String, RateWindow>,
}

impl RateLimiter {
    pub fn new(quota: u32, window: TimeDelta) -> Self {
        Self::with_clock(quota, window, Arc::new(SystemClock))
    }

    pub fn with_clock(quota: u32, window: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota,
            window,
            clock,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.quota, window_from_secs(config.window_secs))
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Count a request against `api_key`, failing once the quota is exceeded.
    pub fn enforce(&self, api_key: &str) -> WeatherResult<()> {
        let now = self.clock.now();

        let count = {
            let mut entry = self
                .windows
                .entry(api_key.to_string())
                .or_insert_with(|| RateWindow::open(now));
            let window = entry.value_mut();

            if now - window.window_start >= self.window {
                *window = RateWindow::open(now);
            }

            window.count = window.count.saturating_add(1);
            window.count
        };

        if count > self.quota {
            tracing::warn!(count, quota = self.quota, "rate limit exceeded");
            return Err(WeatherError::RateLimitExceeded);
        }

        tracing::debug!(count, quota = self.quota, "request admitted");
        Ok(())
    }

    /// Current window for `api_key`, if the key has been seen.
    pub fn snapshot(&self, api_key: &str) -> Option<RateWindow> {
        self.windows.get(api_key).map(|w| *w.value())
    }

    /// Drop windows that have run out. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, w| now - w.window_start < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

fn window_from_secs(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}
