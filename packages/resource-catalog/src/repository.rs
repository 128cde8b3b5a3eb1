//! Resource repository: the read API the rest of the portal consumes.
//!
//! Every read loads the bucket afresh unless the session cache is enabled,
//! in which case the normalized set is built once and only replaced
//! wholesale by [`ResourceRepository::reload`].

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::backends::{BackendExt, HttpBackend};
use crate::classify::program_info;
use crate::error::{CatalogError, Result};
use crate::loader::{CatalogLoader, LoadReport};
use crate::normalize::normalize_all;
use crate::query::apply_filters;
use crate::traits::backend::StorageBackend;
use crate::traits::bookmarks::{BookmarkSource, NoBookmarks};
use crate::types::config::{LoaderConfig, StorageConfig};
use crate::types::filter::ResourceFilters;
use crate::types::resource::{ClinicalProgram, Program, ResourceItem};

type ResourceSet = Arc<Vec<ResourceItem>>;

/// Loads, normalizes and serves the resource set.
///
/// # Example
///
/// ```rust,ignore
/// use resource_catalog::{LoaderConfig, Program, ResourceFilters, ResourceRepository, StorageConfig};
///
/// let repository = ResourceRepository::from_config(StorageConfig::from_env()?, &LoaderConfig::from_env()?)?
///     .with_session_cache();
///
/// let forms = repository
///     .get_resources(&ResourceFilters::new().with_program(Program::Tmm))
///     .await?;
/// ```
pub struct ResourceRepository {
    loader: CatalogLoader,
    storage: StorageConfig,
    bookmarks: Arc<dyn BookmarkSource>,
    /// `None` = no caching; `Some` holds the memoized set once loaded
    cache: Option<RwLock<Option<ResourceSet>>>,
}

impl ResourceRepository {
    /// Create a repository around an existing loader.
    pub fn new(loader: CatalogLoader, storage: StorageConfig) -> Self {
        Self {
            loader,
            storage,
            bookmarks: Arc::new(NoBookmarks),
            cache: None,
        }
    }

    /// Standard strategy chain over `backend`.
    pub fn with_backend(
        backend: Arc<dyn StorageBackend>,
        storage: StorageConfig,
        config: &LoaderConfig,
    ) -> Self {
        let loader = CatalogLoader::new(backend, &storage, config);
        Self::new(loader, storage)
    }

    /// Standard strategy chain over the HTTP backend, paced when
    /// `config.requests_per_second` is set.
    pub fn from_config(storage: StorageConfig, config: &LoaderConfig) -> Result<Self> {
        let http = HttpBackend::new(storage.clone(), config)?;
        let backend: Arc<dyn StorageBackend> = match config.requests_per_second {
            Some(rps) => Arc::new(http.rate_limited(rps)),
            None => Arc::new(http),
        };
        Ok(Self::with_backend(backend, storage, config))
    }

    /// Overlay `bookmarked` from this source on every returned item.
    pub fn with_bookmarks(mut self, bookmarks: impl BookmarkSource + 'static) -> Self {
        self.bookmarks = Arc::new(bookmarks);
        self
    }

    /// Memoize the normalized set for this repository's lifetime.
    pub fn with_session_cache(mut self) -> Self {
        self.cache = Some(RwLock::new(None));
        self
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Every resource in the bucket.
    pub async fn get_all_resources(&self) -> Result<Vec<ResourceItem>> {
        let items = self.resources().await?;
        Ok(self.overlay_bookmarks(items.iter().cloned().collect()))
    }

    /// Clinical programs that have at least one resource, sorted by slug.
    pub async fn derive_programs(&self) -> Result<Vec<ClinicalProgram>> {
        let items = self.resources().await?;

        let mut programs: Vec<ClinicalProgram> = Program::CLINICAL
            .into_iter()
            .filter_map(|program| {
                let resource_count = items.iter().filter(|i| i.program == program).count();
                if resource_count == 0 {
                    return None;
                }
                let info = program_info(program)?;
                Some(ClinicalProgram {
                    slug: program,
                    name: info.name.to_string(),
                    description: info.description.to_string(),
                    icon: info.icon.to_string(),
                    resource_count,
                })
            })
            .collect();
        programs.sort_by(|a, b| a.slug.slug().cmp(b.slug.slug()));

        Ok(programs)
    }

    /// Filtered, sorted, paged view of the resource set.
    pub async fn get_resources(&self, filters: &ResourceFilters) -> Result<Vec<ResourceItem>> {
        let items = self.resources().await?;
        let matched = apply_filters(&items, filters);
        debug!(total = items.len(), matched = matched.len(), "Applied resource filters");
        Ok(self.overlay_bookmarks(matched))
    }

    /// Same as [`derive_programs`](Self::derive_programs).
    pub async fn get_programs(&self) -> Result<Vec<ClinicalProgram>> {
        self.derive_programs().await
    }

    /// Look up one resource by id.
    pub async fn get_resource_by_id(&self, id: &str) -> Result<ResourceItem> {
        let items = self.resources().await?;
        let mut item = items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;

        item.bookmarked = self.bookmarks.is_bookmarked(&item.id);
        Ok(item)
    }

    /// Run the loader now, replacing the cached set when caching is on.
    pub async fn reload(&self) -> Result<LoadReport> {
        let report = self.loader.load().await?;
        let items = Arc::new(normalize_all(&report.entries, &self.storage));
        log_report(&report, items.len());

        if let Some(cache) = &self.cache {
            *cache.write().await = Some(items);
        }
        Ok(report)
    }

    async fn resources(&self) -> Result<ResourceSet> {
        let Some(cache) = &self.cache else {
            return self.load_fresh().await;
        };

        if let Some(items) = cache.read().await.as_ref() {
            return Ok(items.clone());
        }

        let mut guard = cache.write().await;
        // Another reader may have filled the cache while we waited.
        if let Some(items) = guard.as_ref() {
            return Ok(items.clone());
        }
        let items = self.load_fresh().await?;
        *guard = Some(items.clone());
        Ok(items)
    }

    async fn load_fresh(&self) -> Result<ResourceSet> {
        let report = self.loader.load().await?;
        let items = normalize_all(&report.entries, &self.storage);
        log_report(&report, items.len());
        Ok(Arc::new(items))
    }

    fn overlay_bookmarks(&self, mut items: Vec<ResourceItem>) -> Vec<ResourceItem> {
        let bookmarked = self.bookmarks.bookmarked_ids();
        for item in &mut items {
            item.bookmarked = bookmarked.contains(&item.id);
        }
        items
    }
}

fn log_report(report: &LoadReport, resources: usize) {
    info!(
        source = report.source.map(|s| s.as_str()).unwrap_or("none"),
        entries = report.entries.len(),
        resources,
        attempts = report.attempts.len(),
        "Resource catalog loaded"
    );
}
