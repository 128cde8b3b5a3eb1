use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::SourceResult;
use crate::traits::backend::StorageBackend;
use crate::traits::strategy::{AcquisitionStrategy, StrategyKind};
use crate::types::entry::RawStorageEntry;

/// Reads the catalog index table and keeps the rows for one bucket.
pub struct CatalogQuery {
    backend: Arc<dyn StorageBackend>,
    table: String,
    bucket: String,
}

impl CatalogQuery {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        table: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            table: table.into(),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for CatalogQuery {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CatalogQuery
    }

    async fn acquire(&self) -> SourceResult<Vec<RawStorageEntry>> {
        let rows = self.backend.query_catalog(&self.table, &self.bucket).await?;
        let total = rows.len();

        let entries: Vec<RawStorageEntry> = rows
            .into_iter()
            .filter(|row| row.bucket_name.as_deref() == Some(self.bucket.as_str()))
            .filter(|row| !row.file_path.trim().is_empty())
            .map(RawStorageEntry::from)
            .collect();

        debug!(
            table = %self.table,
            rows = total,
            kept = entries.len(),
            "Filtered catalog rows to bucket"
        );

        Ok(entries)
    }

    fn empty_is_final(&self) -> bool {
        false
    }
}
