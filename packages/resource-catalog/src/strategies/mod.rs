//! Acquisition strategies, cheapest first.
//!
//! - `CatalogQuery` - bulk read of the pre-built index table
//! - `ProcedureListing` - one call to the server-side enumeration function
//! - `StorageTraversal` - live, level-by-level walk of the bucket

mod catalog;
mod procedure;
mod traversal;

pub use catalog::CatalogQuery;
pub use procedure::ProcedureListing;
pub use traversal::{looks_like_file, StorageTraversal};

use std::sync::Arc;

use crate::traits::backend::StorageBackend;
use crate::traits::strategy::AcquisitionStrategy;
use crate::types::config::{LoaderConfig, StorageConfig};

/// Marker object storage creates to keep an empty folder alive.
pub(crate) const FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

/// The standard chain: catalog, then procedure, then traversal.
pub fn standard_chain(
    backend: Arc<dyn StorageBackend>,
    storage: &StorageConfig,
    config: &LoaderConfig,
) -> Vec<Box<dyn AcquisitionStrategy>> {
    vec![
        Box::new(CatalogQuery::new(
            backend.clone(),
            &config.catalog_table,
            &storage.bucket,
        )),
        Box::new(ProcedureListing::new(
            backend.clone(),
            &config.listing_procedure,
            &storage.bucket,
        )),
        Box::new(
            StorageTraversal::new(backend, &storage.bucket)
                .with_page_size(config.page_size)
                .with_concurrency(config.traversal_concurrency),
        ),
    ]
}
