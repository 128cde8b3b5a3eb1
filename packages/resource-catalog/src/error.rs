//! Typed errors for the resource catalog.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Two layers:
//! [`SourceError`] is what a single storage boundary or acquisition strategy
//! reports; [`CatalogError`] is what callers of the loader and repository see.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to consumers of the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage endpoint, bucket or credential missing or invalid.
    ///
    /// Fatal for any load; no fallback is attempted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every acquisition strategy failed; carries the last failure.
    #[error("all acquisition strategies failed: {0}")]
    Transport(#[source] SourceError),

    /// The backend kept throttling after all retries were spent.
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// No resource with this id exists in the loaded set.
    #[error("resource not found: {id}")]
    NotFound { id: String },

    /// The whole load exceeded the caller-level timeout.
    #[error("catalog load timed out after {0:?}")]
    Timeout(Duration),
}

impl CatalogError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by a storage boundary call or an acquisition strategy.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure (connection refused, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success response other than throttling (auth, missing table, 5xx)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend signalled "too many requests"
    #[error("rate limited by backend")]
    RateLimited { retry_after: Option<Duration> },

    /// Response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// Missing endpoint or credentials discovered mid-load
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SourceError {
    /// Wrap any transport error.
    pub fn http(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Http(Box::new(err))
    }

    /// Whether the backend asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether this error must abort the strategy chain.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(Box::new(err))
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for boundary and strategy operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
