use std::fmt;

use thiserror::Error;

/// Why a caller-supplied API key was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidKeyReason {
    Missing,
    NotRecognized,
}

impl InvalidKeyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidKeyReason::Missing => "missing",
            InvalidKeyReason::NotRecognized => "not-recognized",
        }
    }
}

impl fmt::Display for InvalidKeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to the upstream weather provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// The provider answered with a non-2xx status.
    #[error("upstream responded with status {status}")]
    Status { status: u16, body: String },

    /// No response was received (connect failure, timeout, broken body).
    #[error("upstream transport failure: {0}")]
    Transport(String),

    /// A 2xx response whose body could not be decoded.
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Status code reported by the provider, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of the durable key store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything a weather request can fail with.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("invalid API key ({0})")]
    InvalidKey(InvalidKeyReason),

    #[error("hourly rate limit exceeded for this API key")]
    RateLimitExceeded,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type WeatherResult<T> = Result<T, WeatherError>;
