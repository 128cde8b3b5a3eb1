//! Integration tests for the full catalog pipeline.
//!
//! Each test drives `ResourceRepository` through the standard strategy chain
//! over a `MockBackend`, then checks both the returned records and the
//! boundary calls that produced them.

use async_trait::async_trait;
use resource_catalog::testing::{catalog_row, Boundary, BackendCall, MockBackend, MockFailure};
use resource_catalog::{
    AcquisitionStrategy, CatalogError, CatalogLoader, LoaderConfig, Program, RawStorageEntry,
    ResourceFilters, ResourceRepository, ResourceType, RetryPolicy, SortField, SortOrder,
    SourceResult, StorageConfig, StrategyKind,
};
use std::sync::Arc;
use std::time::Duration;

fn storage() -> StorageConfig {
    StorageConfig::new("https://store.example.org", "resources", "anon-key").unwrap()
}

fn config() -> LoaderConfig {
    LoaderConfig::default().with_retry(RetryPolicy::immediate(3))
}

fn repository(mock: &MockBackend) -> ResourceRepository {
    ResourceRepository::with_backend(Arc::new(mock.clone()), storage(), &config())
}

#[tokio::test]
async fn test_catalog_answer_skips_other_strategies() {
    let mock = MockBackend::new()
        .with_catalog_file("MTMTheFutureToday/forms/CMR/worksheet.pdf")
        .with_procedure_file("should/not/be/used.pdf")
        .with_file("should/not/be/traversed.pdf", 1);

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(mock.boundary_order(), vec![Boundary::Catalog]);
}

#[tokio::test]
async fn test_worksheet_example_end_to_end() {
    let mock = MockBackend::new().with_procedure_file("MTMTheFutureToday/forms/CMR/worksheet.pdf");

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.program, Program::Mtmtft);
    assert_eq!(item.resource_type, ResourceType::DocumentationForms);
    assert_eq!(item.category.as_deref(), Some("Cmr"));
    assert_eq!(item.name, "worksheet");
    assert_eq!(
        item.file_url.as_deref(),
        Some("https://store.example.org/storage/v1/object/public/resources/MTMTheFutureToday/forms/CMR/worksheet.pdf")
    );
}

#[tokio::test]
async fn test_empty_catalog_falls_through_to_procedure() {
    let mock = MockBackend::new().with_procedure_file("TimeMyMeds/forms/sync.pdf");

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "object:TimeMyMeds/forms/sync.pdf");
    assert_eq!(mock.boundary_order(), vec![Boundary::Catalog, Boundary::Procedure]);
}

#[tokio::test]
async fn test_catalog_rows_for_other_buckets_count_as_empty() {
    let mut foreign = catalog_row("TimeMyMeds/forms/sync.pdf");
    foreign.bucket_name = Some("archive".into());
    let mock = MockBackend::new()
        .with_catalog_row(foreign)
        .with_procedure_file("TimeMyMeds/forms/live.pdf");

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "live");
}

#[tokio::test]
async fn test_empty_procedure_result_is_final() {
    let mock = MockBackend::new().with_file("TimeMyMeds/forms/sync.pdf", 10);

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert!(items.is_empty());
    assert_eq!(mock.call_count(Boundary::Listing), 0);
}

#[tokio::test]
async fn test_traversal_only_when_both_others_fail() {
    let mock = MockBackend::new()
        .with_failure(Boundary::Catalog, MockFailure::Http(404))
        .with_failure(Boundary::Procedure, MockFailure::Network)
        .with_file("TestAndTreat/protocols/strep_throat/protocol.pdf", 2_097_152)
        .with_file("Clinical Guidelines/ada-2024.pdf", 1024);

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(
        mock.boundary_order(),
        vec![Boundary::Catalog, Boundary::Procedure, Boundary::Listing]
    );
    assert_eq!(items.len(), 2);

    let protocol = items.iter().find(|i| i.name == "protocol").unwrap();
    assert_eq!(protocol.program, Program::Tnt);
    assert_eq!(protocol.resource_type, ResourceType::ClinicalProtocols);
    assert_eq!(protocol.category.as_deref(), Some("Strep Throat"));
    assert_eq!(protocol.size_mb, Some(2.0));

    let guideline = items.iter().find(|i| i.name == "ada-2024").unwrap();
    assert_eq!(guideline.program, Program::General);
    assert_eq!(guideline.resource_type, ResourceType::ClinicalGuidelines);
}

#[tokio::test]
async fn test_rate_limit_retries_same_strategy() {
    let mock = MockBackend::new()
        .with_catalog_file("TimeMyMeds/forms/sync.pdf")
        .with_failure(Boundary::Catalog, MockFailure::RateLimited { times: 2 });

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(mock.call_count(Boundary::Catalog), 3);
    assert_eq!(mock.call_count(Boundary::Procedure), 0);
}

#[tokio::test]
async fn test_exhausted_rate_limit_falls_through() {
    let mock = MockBackend::new()
        .with_catalog_file("TimeMyMeds/forms/sync.pdf")
        .with_failure(Boundary::Catalog, MockFailure::RateLimited { times: 10 })
        .with_procedure_file("TimeMyMeds/forms/fallback.pdf");

    let items = repository(&mock).get_all_resources().await.unwrap();

    assert_eq!(items[0].name, "fallback");
    assert_eq!(mock.call_count(Boundary::Catalog), 4);
}

#[tokio::test]
async fn test_configuration_error_aborts_chain() {
    let mock = MockBackend::new()
        .with_failure(Boundary::Catalog, MockFailure::Configuration)
        .with_procedure_file("TimeMyMeds/forms/sync.pdf");

    let err = repository(&mock).get_all_resources().await.unwrap_err();

    assert!(matches!(err, CatalogError::Configuration(_)));
    assert_eq!(mock.boundary_order(), vec![Boundary::Catalog]);
}

#[tokio::test]
async fn test_all_strategies_failing_surfaces_transport_error() {
    let mock = MockBackend::new()
        .with_failure(Boundary::Catalog, MockFailure::Http(500))
        .with_failure(Boundary::Procedure, MockFailure::Http(500))
        .with_failure(Boundary::Listing, MockFailure::Network);

    let err = repository(&mock).get_all_resources().await.unwrap_err();

    assert!(matches!(err, CatalogError::Transport(_)));
}

#[tokio::test]
async fn test_nested_listing_failure_is_not_a_partial_catalog() {
    let mock = MockBackend::new()
        .with_failure(Boundary::Catalog, MockFailure::Http(404))
        .with_failure(Boundary::Procedure, MockFailure::Http(404))
        .with_file("TimeMyMeds/forms/a.pdf", 1)
        .with_file("TestAndTreat/forms/b.pdf", 1)
        .with_listing_failure("TestAndTreat", MockFailure::Network);

    let err = repository(&mock).get_all_resources().await.unwrap_err();

    assert!(matches!(err, CatalogError::Transport(_)));
}

#[tokio::test]
async fn test_get_resources_program_list_desc() {
    let mock = MockBackend::new()
        .with_catalog_file("TimeMyMeds/forms/appointment.pdf")
        .with_catalog_file("TimeMyMeds/training/sync-basics.pdf")
        .with_catalog_file("OralContraceptives/protocols/consult.pdf")
        .with_catalog_file("MTMTheFutureToday/forms/CMR/worksheet.pdf")
        .with_catalog_file("Medical Billing/codes.xlsx");

    let filters = ResourceFilters::new()
        .with_programs([Program::Tmm, Program::Oc])
        .sorted_by(SortField::Name, SortOrder::Desc);
    let items = repository(&mock).get_resources(&filters).await.unwrap();

    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["sync-basics", "consult", "appointment"]);
}

#[tokio::test]
async fn test_programs_from_traversal() {
    let mock = MockBackend::new()
        .with_failure(Boundary::Catalog, MockFailure::Http(404))
        .with_failure(Boundary::Procedure, MockFailure::Http(404))
        .with_file("HbA1cTesting/training/meter.mp4", 1)
        .with_file("HbA1cTesting/forms/log.pdf", 1)
        .with_file("TimeMyMeds/forms/sync.pdf", 1)
        .with_file("Patient Handouts/diet.pdf", 1);

    let programs = repository(&mock).get_programs().await.unwrap();

    let summary: Vec<(&str, usize)> = programs
        .iter()
        .map(|p| (p.slug.slug(), p.resource_count))
        .collect();
    assert_eq!(summary, vec![("a1c", 2), ("tmm", 1)]);
}

#[tokio::test]
async fn test_get_resource_by_id_not_found() {
    let mock = MockBackend::new().with_catalog_file("TimeMyMeds/forms/sync.pdf");
    let repository = repository(&mock);

    let found = repository
        .get_resource_by_id("catalog:TimeMyMeds/forms/sync.pdf")
        .await
        .unwrap();
    assert_eq!(found.name, "sync");

    let err = repository.get_resource_by_id("missing").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { ref id } if id == "missing"));
}

#[tokio::test]
async fn test_traversal_requests_use_configured_bucket() {
    let storage = StorageConfig::new("https://store.example.org", "member-files", "anon-key").unwrap();
    let mock = MockBackend::new()
        .with_failure(Boundary::Catalog, MockFailure::Http(404))
        .with_failure(Boundary::Procedure, MockFailure::Http(404));
    let repository = ResourceRepository::with_backend(Arc::new(mock.clone()), storage, &config());

    repository.get_all_resources().await.unwrap();

    assert!(mock.calls().iter().any(|call| matches!(
        call,
        BackendCall::ListDirectory { bucket, prefix, .. } if bucket == "member-files" && prefix.is_empty()
    )));
}

struct SlowStrategy;

#[async_trait]
impl AcquisitionStrategy for SlowStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StorageTraversal
    }

    async fn acquire(&self) -> SourceResult<Vec<RawStorageEntry>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_whole_load_timeout() {
    let config = config().with_timeout(Duration::from_millis(50));
    let loader = CatalogLoader::with_strategies(vec![Box::new(SlowStrategy)], &config);
    let repository = ResourceRepository::new(loader, storage());

    let err = repository.get_all_resources().await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout(d) if d == Duration::from_millis(50)));
}

#[test]
fn test_repository_usable_from_blocking_code() {
    let mock = MockBackend::new().with_catalog_file("OralContraceptives/forms/intake.pdf");
    let repository = repository(&mock);

    let items = tokio_test::block_on(repository.get_all_resources()).unwrap();
    assert_eq!(items[0].program, Program::Oc);
}
