//! Storage boundary trait.
//!
//! One method per external boundary the catalog reads from. Backends do I/O
//! and decoding only; bucket filtering, folder detection and fallback policy
//! live in the strategies and the loader.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SourceResult;
use crate::types::entry::{CatalogRow, ListOptions, ListedObject, ProcedureRow};

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Bulk read of the catalog index table.
    ///
    /// May return rows for other buckets; callers filter.
    async fn query_catalog(&self, table: &str, bucket: &str) -> SourceResult<Vec<CatalogRow>>;

    /// Single call to the server-side enumeration function.
    async fn call_listing_procedure(
        &self,
        procedure: &str,
        bucket: &str,
    ) -> SourceResult<Vec<ProcedureRow>>;

    /// One page of one directory level.
    ///
    /// `prefix` is the directory path without a trailing `/` (empty for the
    /// bucket root). An empty directory yields an empty page, not an error.
    async fn list_directory(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> SourceResult<Vec<ListedObject>>;

    /// Backend name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    async fn query_catalog(&self, table: &str, bucket: &str) -> SourceResult<Vec<CatalogRow>> {
        (**self).query_catalog(table, bucket).await
    }

    async fn call_listing_procedure(
        &self,
        procedure: &str,
        bucket: &str,
    ) -> SourceResult<Vec<ProcedureRow>> {
        (**self).call_listing_procedure(procedure, bucket).await
    }

    async fn list_directory(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> SourceResult<Vec<ListedObject>> {
        (**self).list_directory(bucket, prefix, options).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
