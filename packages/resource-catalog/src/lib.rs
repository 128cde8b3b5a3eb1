//! Resource Catalog Resolution & Normalization
//!
//! Discovers every file in the member portal's storage bucket, turns each
//! one into a typed resource record (program, type, category, tags) and
//! serves filtered, sorted views of that set.
//!
//! # Pipeline
//!
//! 1. **Acquire** raw entries through a fallback chain: catalog table query,
//!    then the server-side listing procedure, then a live traversal of the
//!    bucket ([`CatalogLoader`])
//! 2. **Classify** each path against the folder grammar ([`classify`])
//! 3. **Normalize** rows into [`ResourceItem`]s ([`normalize`])
//! 4. **Query** the set with [`apply_filters`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use resource_catalog::{LoaderConfig, Program, ResourceFilters, ResourceRepository, StorageConfig};
//! use resource_catalog::{SortField, SortOrder};
//!
//! let repository = ResourceRepository::from_config(StorageConfig::from_env()?, &LoaderConfig::default())?;
//!
//! let filters = ResourceFilters::new()
//!     .with_programs([Program::Tmm, Program::Oc])
//!     .sorted_by(SortField::Name, SortOrder::Desc);
//! let resources = repository.get_resources(&filters).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for storage backends, strategies and bookmarks
//! - [`types`] - Config, raw entries, resource records and filters
//! - [`backends`] - HTTP backend and client-side rate limiting
//! - [`strategies`] - The three acquisition strategies
//! - [`loader`] - Strategy chain with load reports
//! - [`repository`] - Read API consumed by the portal
//! - [`testing`] - Mock backend and fixtures

pub mod backends;
pub mod classify;
pub mod credentials;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod query;
pub mod repository;
pub mod retry;
pub mod strategies;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CatalogError, Result, SourceError, SourceResult};
pub use traits::{
    backend::StorageBackend,
    bookmarks::{BookmarkSource, NoBookmarks},
    strategy::{AcquisitionStrategy, StrategyKind},
};
pub use types::{
    config::{LoaderConfig, StorageConfig, DEFAULT_BUCKET},
    entry::{CatalogRow, EntryMetadata, ListOptions, ListedObject, ProcedureRow, RawStorageEntry},
    filter::{OneOrMany, ResourceFilters, SortField, SortOrder},
    resource::{ClinicalProgram, Program, ResourceItem, ResourceType},
};

pub use backends::{BackendExt, HttpBackend, RateLimitedBackend};
pub use classify::{classify, Classification};
pub use credentials::ApiKey;
pub use loader::{CatalogLoader, LoadReport, StrategyAttempt, StrategyOutcome};
pub use normalize::{normalize, normalize_all};
pub use query::apply_filters;
pub use repository::ResourceRepository;
pub use retry::RetryPolicy;
pub use strategies::{CatalogQuery, ProcedureListing, StorageTraversal};

// Re-export testing utilities
pub use testing::{BackendCall, MockBackend, MockFailure};
