//! REST storage backend.
//!
//! Talks to a PostgREST-style table/RPC API and an object-storage listing
//! API that share one base endpoint and one API key.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CatalogError, Result, SourceError, SourceResult};
use crate::traits::backend::StorageBackend;
use crate::types::config::{LoaderConfig, StorageConfig};
use crate::types::entry::{CatalogRow, ListOptions, ListedObject, ProcedureRow};

/// HTTP backend for the three storage boundaries.
///
/// # Example
///
/// ```rust,ignore
/// use resource_catalog::{HttpBackend, LoaderConfig, StorageConfig};
///
/// let storage = StorageConfig::from_env()?;
/// let backend = HttpBackend::new(storage, &LoaderConfig::default())?;
/// let rows = backend.query_catalog("storage_files", "resources").await?;
/// ```
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    storage: StorageConfig,
}

impl HttpBackend {
    /// Create a backend with a client honoring `config.request_timeout`.
    pub fn new(storage: StorageConfig, config: &LoaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CatalogError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, storage })
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// `<endpoint>/<segments...>`, each segment percent-encoded.
    fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.storage.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the API key both ways the services expect it.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.storage.credential.expose();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> SourceResult<T> {
        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            let err = error_for_status(status, retry_after, body);
            warn!(request = what, status = status.as_u16(), error = %err, "Storage request failed");
            return Err(err);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            SourceError::Decode(format!("{} returned an unexpected body: {}", what, e))
        })
    }
}

#[async_trait]
impl StorageBackend for HttpBackend {
    async fn query_catalog(&self, table: &str, bucket: &str) -> SourceResult<Vec<CatalogRow>> {
        let url = self.endpoint_url(&["rest", "v1", table]);
        debug!(url = %url, bucket, "Querying catalog table");

        let response = self
            .authorized(self.client.get(url))
            .query(&[("select", "*".to_string()), ("bucket_name", format!("eq.{}", bucket))])
            .send()
            .await?;

        Self::read_json(response, "catalog query").await
    }

    async fn call_listing_procedure(
        &self,
        procedure: &str,
        bucket: &str,
    ) -> SourceResult<Vec<ProcedureRow>> {
        let url = self.endpoint_url(&["rest", "v1", "rpc", procedure]);
        debug!(url = %url, bucket, "Calling listing procedure");

        let response = self
            .authorized(self.client.post(url))
            .json(&json!({ "bucket_name": bucket }))
            .send()
            .await?;

        Self::read_json(response, "listing procedure").await
    }

    async fn list_directory(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> SourceResult<Vec<ListedObject>> {
        let url = self.endpoint_url(&["storage", "v1", "object", "list", bucket]);
        debug!(
            prefix,
            offset = options.offset,
            limit = options.limit,
            "Listing storage directory"
        );

        let response = self
            .authorized(self.client.post(url))
            .json(&json!({
                "prefix": prefix,
                "limit": options.limit,
                "offset": options.offset,
                "sortBy": { "column": "name", "order": "asc" },
            }))
            .send()
            .await?;

        Self::read_json(response, "directory listing").await
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Map a non-success status to a source error.
fn error_for_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> SourceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return SourceError::RateLimited { retry_after };
    }

    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };

    SourceError::Api {
        status: status.as_u16(),
        message,
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored and the
/// retry policy's own schedule applies.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn backend() -> HttpBackend {
        let storage =
            StorageConfig::new("https://store.example.org", "resources", "anon-key").unwrap();
        HttpBackend::new(storage, &LoaderConfig::default()).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let backend = backend();
        assert_eq!(
            backend.endpoint_url(&["rest", "v1", "storage_files"]).as_str(),
            "https://store.example.org/rest/v1/storage_files"
        );
        assert_eq!(
            backend
                .endpoint_url(&["storage", "v1", "object", "list", "member resources"])
                .as_str(),
            "https://store.example.org/storage/v1/object/list/member%20resources"
        );
    }

    #[test]
    fn test_too_many_requests_is_rate_limited() {
        let err = error_for_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(3)),
            String::new(),
        );
        match err {
            SourceError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(3)))
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[test]
    fn test_other_statuses_are_api_errors() {
        let err = error_for_status(StatusCode::NOT_FOUND, None, "relation does not exist".into());
        assert!(matches!(err, SourceError::Api { status: 404, ref message } if message == "relation does not exist"));

        let err = error_for_status(StatusCode::UNAUTHORIZED, None, "  ".into());
        assert!(matches!(err, SourceError::Api { status: 401, ref message } if message == "Unauthorized"));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(backend().name(), "http");
    }
}
