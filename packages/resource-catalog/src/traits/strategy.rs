//! Acquisition strategy trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SourceResult;
use crate::types::entry::RawStorageEntry;

/// Which acquisition method produced a row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CatalogQuery,
    ProcedureListing,
    StorageTraversal,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CatalogQuery => "catalog_query",
            StrategyKind::ProcedureListing => "procedure_listing",
            StrategyKind::StorageTraversal => "storage_traversal",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One way of discovering the bucket's files.
///
/// The loader tries strategies in order. Implementations report failure
/// through the returned `Result`; an empty `Ok` is a success with no rows.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Discover every file this strategy can see.
    async fn acquire(&self) -> SourceResult<Vec<RawStorageEntry>>;

    /// Whether an empty result ends the chain.
    ///
    /// The catalog answers `false`: an empty index must not hide files that
    /// were uploaded without being catalogued.
    fn empty_is_final(&self) -> bool {
        true
    }
}
