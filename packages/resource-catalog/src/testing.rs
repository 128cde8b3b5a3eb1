//! Testing utilities including mock implementations.
//!
//! These let applications exercise the catalog pipeline without a storage
//! service: every boundary call is recorded so fallback order can be
//! asserted, and each boundary can be told to fail.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{SourceError, SourceResult};
use crate::traits::backend::StorageBackend;
use crate::traits::strategy::{AcquisitionStrategy, StrategyKind};
use crate::types::entry::{CatalogRow, ListOptions, ListedObject, ProcedureRow, RawStorageEntry};
use crate::types::resource::{Program, ResourceItem, ResourceType};

/// Record of a call made to the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CatalogQuery {
        table: String,
        bucket: String,
    },
    ListingProcedure {
        procedure: String,
        bucket: String,
    },
    ListDirectory {
        bucket: String,
        prefix: String,
        offset: usize,
        limit: usize,
    },
}

impl BackendCall {
    /// Which boundary this call went to.
    pub fn boundary(&self) -> Boundary {
        match self {
            BackendCall::CatalogQuery { .. } => Boundary::Catalog,
            BackendCall::ListingProcedure { .. } => Boundary::Procedure,
            BackendCall::ListDirectory { .. } => Boundary::Listing,
        }
    }
}

/// The three storage boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Catalog,
    Procedure,
    Listing,
}

/// A canned failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-success status other than 429
    Http(u16),
    /// "Too many requests" for the next `times` calls, then success
    RateLimited { times: u32 },
    /// Connection-level failure
    Network,
    /// Missing credentials
    Configuration,
}

impl MockFailure {
    /// The source error this failure reports.
    pub fn to_error(&self) -> SourceError {
        match self {
            MockFailure::Http(status) => SourceError::Api {
                status: *status,
                message: format!("mock failure ({})", status),
            },
            MockFailure::RateLimited { .. } => SourceError::RateLimited { retry_after: None },
            MockFailure::Network => SourceError::http(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock connection refused",
            )),
            MockFailure::Configuration => {
                SourceError::Configuration("mock backend has no credentials".into())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FailurePoint {
    Boundary(Boundary),
    Directory(String),
}

/// Mock storage backend for testing.
///
/// Clones share state, so a test can keep a handle for assertions after
/// handing a clone to a strategy or repository.
///
/// # Example
///
/// ```rust
/// use resource_catalog::testing::{Boundary, MockBackend, MockFailure};
///
/// let mock = MockBackend::new()
///     .with_file("TimeMyMeds/forms/sync.pdf", 2048)
///     .with_failure(Boundary::Catalog, MockFailure::Http(404));
/// ```
#[derive(Clone, Default)]
pub struct MockBackend {
    catalog: Arc<RwLock<Vec<CatalogRow>>>,
    procedure: Arc<RwLock<Vec<ProcedureRow>>>,
    /// Directory prefix (no trailing `/`, root is `""`) -> entries
    tree: Arc<RwLock<HashMap<String, Vec<ListedObject>>>>,
    failures: Arc<RwLock<HashMap<FailurePoint, MockFailure>>>,
    calls: Arc<RwLock<Vec<BackendCall>>>,
}

impl MockBackend {
    /// Create an empty mock: empty catalog, empty procedure, empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog table row.
    pub fn with_catalog_row(self, row: CatalogRow) -> Self {
        self.catalog.write().unwrap().push(row);
        self
    }

    /// Add a catalog row for `path` in the `resources` bucket.
    pub fn with_catalog_file(self, path: &str) -> Self {
        self.with_catalog_row(catalog_row(path))
    }

    /// Add a listing procedure row.
    pub fn with_procedure_row(self, row: ProcedureRow) -> Self {
        self.procedure.write().unwrap().push(row);
        self
    }

    /// Add a procedure row for `path`.
    pub fn with_procedure_file(self, path: &str) -> Self {
        self.with_procedure_row(procedure_row(path))
    }

    /// Put a file in the bucket tree, creating folder entries on the way.
    ///
    /// The object id is the path.
    pub fn with_file(self, path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        {
            let mut tree = self.tree.write().unwrap();
            let mut prefix = String::new();
            for (i, segment) in segments.iter().enumerate() {
                let listing = tree.entry(prefix.clone()).or_default();
                let is_file = i == segments.len() - 1;
                if !listing.iter().any(|o| o.name == *segment) {
                    listing.push(if is_file {
                        ListedObject::file(*segment, path.as_str(), size)
                    } else {
                        ListedObject::folder(*segment)
                    });
                }
                if !is_file {
                    prefix = if prefix.is_empty() {
                        segment.to_string()
                    } else {
                        format!("{}/{}", prefix, segment)
                    };
                }
            }
        }
        self
    }

    /// Replace one directory's listing verbatim.
    pub fn with_listing(self, prefix: impl Into<String>, objects: Vec<ListedObject>) -> Self {
        self.tree.write().unwrap().insert(prefix.into(), objects);
        self
    }

    /// Make every call to `boundary` fail.
    pub fn with_failure(self, boundary: Boundary, failure: MockFailure) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(FailurePoint::Boundary(boundary), failure);
        self
    }

    /// Make listing one directory fail.
    pub fn with_listing_failure(self, prefix: impl Into<String>, failure: MockFailure) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(FailurePoint::Directory(prefix.into()), failure);
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made to one boundary.
    pub fn call_count(&self, boundary: Boundary) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.boundary() == boundary)
            .count()
    }

    /// Boundaries in the order they were first called.
    pub fn boundary_order(&self) -> Vec<Boundary> {
        let mut order = Vec::new();
        for call in self.calls.read().unwrap().iter() {
            let boundary = call.boundary();
            if !order.contains(&boundary) {
                order.push(boundary);
            }
        }
        order
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn record(&self, call: BackendCall) {
        self.calls.write().unwrap().push(call);
    }

    /// Pending failure for `point`, consuming one rate-limit response.
    fn take_failure(&self, point: &FailurePoint) -> Option<SourceError> {
        let mut failures = self.failures.write().unwrap();
        let failure = *failures.get(point)?;

        if let MockFailure::RateLimited { times } = failure {
            if times <= 1 {
                failures.remove(point);
            } else {
                failures.insert(point.clone(), MockFailure::RateLimited { times: times - 1 });
            }
            if times == 0 {
                return None;
            }
        }

        Some(failure.to_error())
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    async fn query_catalog(&self, table: &str, bucket: &str) -> SourceResult<Vec<CatalogRow>> {
        self.record(BackendCall::CatalogQuery {
            table: table.to_string(),
            bucket: bucket.to_string(),
        });
        if let Some(err) = self.take_failure(&FailurePoint::Boundary(Boundary::Catalog)) {
            return Err(err);
        }
        Ok(self.catalog.read().unwrap().clone())
    }

    async fn call_listing_procedure(
        &self,
        procedure: &str,
        bucket: &str,
    ) -> SourceResult<Vec<ProcedureRow>> {
        self.record(BackendCall::ListingProcedure {
            procedure: procedure.to_string(),
            bucket: bucket.to_string(),
        });
        if let Some(err) = self.take_failure(&FailurePoint::Boundary(Boundary::Procedure)) {
            return Err(err);
        }
        Ok(self.procedure.read().unwrap().clone())
    }

    async fn list_directory(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> SourceResult<Vec<ListedObject>> {
        self.record(BackendCall::ListDirectory {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            offset: options.offset,
            limit: options.limit,
        });
        if let Some(err) = self.take_failure(&FailurePoint::Boundary(Boundary::Listing)) {
            return Err(err);
        }
        if let Some(err) = self.take_failure(&FailurePoint::Directory(prefix.to_string())) {
            return Err(err);
        }

        let mut objects = self
            .tree
            .read()
            .unwrap()
            .get(prefix)
            .cloned()
            .unwrap_or_default();
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(objects
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A strategy with a fixed answer, for loader tests.
pub struct StaticStrategy {
    kind: StrategyKind,
    outcome: Result<Vec<RawStorageEntry>, MockFailure>,
    empty_is_final: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticStrategy {
    /// A strategy that always yields `entries`.
    pub fn succeeding(kind: StrategyKind, entries: Vec<RawStorageEntry>) -> Self {
        Self {
            kind,
            outcome: Ok(entries),
            empty_is_final: kind != StrategyKind::CatalogQuery,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A strategy that always fails with `failure`.
    pub fn failing(kind: StrategyKind, failure: MockFailure) -> Self {
        Self {
            outcome: Err(failure),
            ..Self::succeeding(kind, Vec::new())
        }
    }

    /// Override whether an empty result ends the chain.
    pub fn with_empty_is_final(mut self, empty_is_final: bool) -> Self {
        self.empty_is_final = empty_is_final;
        self
    }

    /// Shared counter of `acquire` calls.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl AcquisitionStrategy for StaticStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn acquire(&self) -> SourceResult<Vec<RawStorageEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(entries) => Ok(entries.clone()),
            Err(failure) => Err(failure.to_error()),
        }
    }

    fn empty_is_final(&self) -> bool {
        self.empty_is_final
    }
}

/// A catalog row for `path` in the `resources` bucket.
pub fn catalog_row(path: &str) -> CatalogRow {
    CatalogRow {
        id: Some(format!("catalog:{}", path)),
        bucket_name: Some("resources".to_string()),
        file_name: path.rsplit('/').next().map(str::to_string),
        file_path: path.to_string(),
        file_size: Some(1024),
        mime_type: Some("application/pdf".to_string()),
        ..Default::default()
    }
}

/// A listing procedure row for `path`.
pub fn procedure_row(path: &str) -> ProcedureRow {
    ProcedureRow {
        path: Some(path.to_string()),
        name: path.rsplit('/').next().unwrap_or_default().to_string(),
        id: Some(format!("object:{}", path)),
        metadata: None,
    }
}

/// A bare normalized item.
pub fn resource_item(id: &str, name: &str, program: Program, resource_type: ResourceType) -> ResourceItem {
    ResourceItem {
        id: id.to_string(),
        name: name.to_string(),
        program,
        resource_type,
        category: None,
        tags: None,
        file_url: None,
        size_mb: None,
        last_updated_iso: None,
        download_count: None,
        bookmarked: false,
    }
}

/// Five items across programs and types, used by query tests.
pub fn sample_items() -> Vec<ResourceItem> {
    let mut sync = resource_item("1", "Med Sync Calendar", Program::Tmm, ResourceType::DocumentationForms);
    sync.category = Some("Scheduling".into());
    sync.tags = Some(vec!["adherence".into(), "calendar".into()]);
    sync.last_updated_iso = Some("2024-03-01T00:00:00.000Z".into());
    sync.download_count = Some(40);

    let mut consult = resource_item("2", "Contraception Consult", Program::Oc, ResourceType::ClinicalProtocols);
    consult.category = Some("Assessment".into());
    consult.tags = Some(vec!["contraception".into()]);
    consult.last_updated_iso = Some("2024-05-10T00:00:00.000Z".into());
    consult.download_count = Some(12);

    let mut appointment = resource_item("3", "Appointment Checklist", Program::Tmm, ResourceType::DocumentationForms);
    appointment.tags = Some(vec!["calendar".into()]);
    appointment.last_updated_iso = Some("2023-11-20T00:00:00.000Z".into());

    let mut cmr = resource_item("4", "CMR Worksheet", Program::Mtmtft, ResourceType::DocumentationForms);
    cmr.category = Some("Cmr".into());
    cmr.last_updated_iso = Some("2024-06-01T00:00:00.000Z".into());
    cmr.download_count = Some(99);

    let mut billing = resource_item("5", "Billing Codes", Program::General, ResourceType::MedicalBilling);
    billing.tags = Some(vec!["billing".into(), "adherence".into()]);

    vec![sync, consult, appointment, cmr, billing]
}
