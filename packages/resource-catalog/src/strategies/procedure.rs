use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::FOLDER_PLACEHOLDER;
use crate::error::SourceResult;
use crate::traits::backend::StorageBackend;
use crate::traits::strategy::{AcquisitionStrategy, StrategyKind};
use crate::types::entry::RawStorageEntry;

/// Enumerates the bucket with one server-side procedure call.
///
/// An empty answer is authoritative: the procedure sees the live bucket.
pub struct ProcedureListing {
    backend: Arc<dyn StorageBackend>,
    procedure: String,
    bucket: String,
}

impl ProcedureListing {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        procedure: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            procedure: procedure.into(),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for ProcedureListing {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProcedureListing
    }

    async fn acquire(&self) -> SourceResult<Vec<RawStorageEntry>> {
        let rows = self
            .backend
            .call_listing_procedure(&self.procedure, &self.bucket)
            .await?;
        debug!(procedure = %self.procedure, rows = rows.len(), "Listing procedure returned");

        Ok(rows
            .into_iter()
            .map(RawStorageEntry::from)
            .filter(|entry| !entry.path.trim().is_empty() && entry.name != FOLDER_PLACEHOLDER)
            .collect())
    }
}
