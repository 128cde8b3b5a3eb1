//! Configuration for the storage boundary and the catalog loader.

use std::env;
use std::time::Duration;
use url::Url;

use crate::credentials::ApiKey;
use crate::error::{CatalogError, Result};
use crate::retry::RetryPolicy;

/// Default bucket holding the portal's resource files.
pub const DEFAULT_BUCKET: &str = "resources";

/// Where the bucket lives and how to authenticate against it.
///
/// Passed explicitly into backends and repositories so tests can run
/// against fixtures instead of process environment.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL of the storage/REST service
    pub endpoint: Url,

    /// Bucket whose objects make up the catalog
    pub bucket: String,

    /// API key sent with every request
    pub credential: ApiKey,
}

impl StorageConfig {
    /// Build and validate a storage config.
    ///
    /// Fails with [`CatalogError::Configuration`] when the endpoint is not an
    /// absolute http(s) URL or the bucket/credential is blank.
    pub fn new(
        endpoint: &str,
        bucket: impl Into<String>,
        credential: impl Into<ApiKey>,
    ) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(CatalogError::config("storage endpoint is not set"));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| CatalogError::config(format!("invalid storage endpoint: {}", e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(CatalogError::config(format!(
                "storage endpoint must be an http(s) URL, got {}",
                endpoint
            )));
        }

        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(CatalogError::config("storage bucket is not set"));
        }

        let credential = credential.into();
        if credential.is_blank() {
            return Err(CatalogError::config("storage credential is not set"));
        }

        Ok(Self {
            endpoint,
            bucket,
            credential,
        })
    }

    /// Load from `CATALOG_ENDPOINT`, `CATALOG_BUCKET` and `CATALOG_CREDENTIAL`.
    ///
    /// A `.env` file is honored when present (development).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let endpoint = env::var("CATALOG_ENDPOINT")
            .map_err(|_| CatalogError::config("CATALOG_ENDPOINT must be set"))?;
        let bucket = env::var("CATALOG_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());
        let credential = env::var("CATALOG_CREDENTIAL")
            .map_err(|_| CatalogError::config("CATALOG_CREDENTIAL must be set"))?;

        Self::new(&endpoint, bucket, credential)
    }

    /// Public download URL for an object path in this bucket.
    ///
    /// Shape: `<endpoint>/storage/v1/object/public/<bucket>/<path>` with each
    /// path segment percent-encoded and `/` separators preserved.
    pub fn public_url(&self, path: &str) -> String {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object", "public", self.bucket.as_str()])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url.to_string()
    }
}

/// Tunables for the acquisition strategies.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Index table mirroring the bucket's contents
    pub catalog_table: String,

    /// Server-side function enumerating the bucket in one call
    pub listing_procedure: String,

    /// Entries requested per directory listing call
    pub page_size: usize,

    /// Directory listings in flight at once during traversal
    pub traversal_concurrency: usize,

    /// Backoff applied when a backend answers "too many requests"
    pub retry: RetryPolicy,

    /// Caller-level timeout around one whole load (None = unbounded)
    pub timeout: Option<Duration>,

    /// Client-side pacing of boundary calls (None = unpaced)
    pub requests_per_second: Option<u32>,

    /// Per-request timeout for the HTTP client
    pub request_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            catalog_table: "storage_files".to_string(),
            listing_procedure: "list_storage_files".to_string(),
            page_size: 100,
            traversal_concurrency: 4,
            retry: RetryPolicy::default(),
            timeout: None,
            requests_per_second: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl LoaderConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `CATALOG_PAGE_SIZE`, `CATALOG_CONCURRENCY`,
    /// `CATALOG_TIMEOUT_SECS` and `CATALOG_RPS` where set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(size) = parse_env::<usize>("CATALOG_PAGE_SIZE")? {
            config = config.with_page_size(size);
        }
        if let Some(width) = parse_env::<usize>("CATALOG_CONCURRENCY")? {
            config = config.with_traversal_concurrency(width);
        }
        if let Some(secs) = parse_env::<u64>("CATALOG_TIMEOUT_SECS")? {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(rps) = parse_env::<u32>("CATALOG_RPS")? {
            config = config.with_requests_per_second(rps);
        }

        Ok(config)
    }

    /// Set the catalog table name.
    pub fn with_catalog_table(mut self, table: impl Into<String>) -> Self {
        self.catalog_table = table.into();
        self
    }

    /// Set the listing procedure name.
    pub fn with_listing_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.listing_procedure = procedure.into();
        self
    }

    /// Set the directory listing page size (minimum 1).
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Set the traversal fan-out width (minimum 1).
    pub fn with_traversal_concurrency(mut self, width: usize) -> Self {
        self.traversal_concurrency = width.max(1);
        self
    }

    /// Set the rate-limit retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound a whole load by a timeout. Zero means no timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Pace boundary calls client-side.
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = Some(rps);
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CatalogError::config(format!("{} must be a valid number", key))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig::new("https://store.example.org", "resources", "anon-key").unwrap()
    }

    #[test]
    fn test_rejects_missing_endpoint() {
        let err = StorageConfig::new("  ", "resources", "key").unwrap_err();
        assert!(matches!(err, CatalogError::Configuration(_)));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(StorageConfig::new("ftp://store.example.org", "resources", "key").is_err());
        assert!(StorageConfig::new("not a url", "resources", "key").is_err());
    }

    #[test]
    fn test_rejects_blank_bucket_and_credential() {
        assert!(StorageConfig::new("https://store.example.org", " ", "key").is_err());
        assert!(StorageConfig::new("https://store.example.org", "resources", "").is_err());
    }

    #[test]
    fn test_credential_not_in_debug() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("anon-key"));
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let url = config().public_url("MTMTheFutureToday/forms/CMR Forms/work sheet.pdf");
        assert_eq!(
            url,
            "https://store.example.org/storage/v1/object/public/resources/MTMTheFutureToday/forms/CMR%20Forms/work%20sheet.pdf"
        );
    }

    #[test]
    fn test_public_url_with_trailing_slash_endpoint() {
        let config =
            StorageConfig::new("https://store.example.org/", "resources", "anon-key").unwrap();
        assert_eq!(
            config.public_url("a.pdf"),
            "https://store.example.org/storage/v1/object/public/resources/a.pdf"
        );
    }

    #[test]
    fn test_loader_config_builders_clamp() {
        let config = LoaderConfig::new()
            .with_page_size(0)
            .with_traversal_concurrency(0)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.page_size, 1);
        assert_eq!(config.traversal_concurrency, 1);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let config = LoaderConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::ZERO);
        assert_eq!(config.timeout, None);

        std::env::set_var("CATALOG_TIMEOUT_SECS", "0");
        let from_env = LoaderConfig::from_env();
        std::env::remove_var("CATALOG_TIMEOUT_SECS");
        assert_eq!(from_env.unwrap().timeout, None);
    }
}
