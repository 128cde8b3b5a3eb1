//! Client-side pacing for storage backends.
//!
//! Wraps any `StorageBackend` with a governor rate limiter so a traversal
//! over a large bucket does not trip the server's throttling.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::SourceResult;
use crate::traits::backend::StorageBackend;
use crate::types::entry::{CatalogRow, ListOptions, ListedObject, ProcedureRow};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A backend wrapper that waits for a permit before every boundary call.
///
/// Clones share one limiter, so the quota holds across concurrent
/// directory listings.
pub struct RateLimitedBackend<B: StorageBackend> {
    inner: B,
    limiter: Arc<DirectRateLimiter>,
}

impl<B: StorageBackend> RateLimitedBackend<B> {
    /// Wrap `backend` at `requests_per_second` (0 is treated as 1).
    pub fn new(backend: B, requests_per_second: u32) -> Self {
        Self::with_quota(backend, Quota::per_second(non_zero(requests_per_second)))
    }

    /// Sustained rate plus a burst allowance.
    pub fn with_burst(backend: B, requests_per_second: u32, burst: u32) -> Self {
        let quota =
            Quota::per_second(non_zero(requests_per_second)).allow_burst(non_zero(burst));
        Self::with_quota(backend, quota)
    }

    /// Create with a custom quota.
    pub fn with_quota(backend: B, quota: Quota) -> Self {
        Self {
            inner: backend,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }
}

fn non_zero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for RateLimitedBackend<B> {
    async fn query_catalog(&self, table: &str, bucket: &str) -> SourceResult<Vec<CatalogRow>> {
        self.wait_for_permit().await;
        self.inner.query_catalog(table, bucket).await
    }

    async fn call_listing_procedure(
        &self,
        procedure: &str,
        bucket: &str,
    ) -> SourceResult<Vec<ProcedureRow>> {
        self.wait_for_permit().await;
        self.inner.call_listing_procedure(procedure, bucket).await
    }

    async fn list_directory(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> SourceResult<Vec<ListedObject>> {
        self.wait_for_permit().await;
        self.inner.list_directory(bucket, prefix, options).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for pacing any backend.
pub trait BackendExt: StorageBackend + Sized {
    /// Wrap this backend with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedBackend<Self> {
        RateLimitedBackend::new(self, requests_per_second)
    }
}

impl<B: StorageBackend + Sized> BackendExt for B {}
