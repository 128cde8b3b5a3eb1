//! Live traversal of the bucket, one directory level at a time.
//!
//! Each level's directories are listed concurrently (bounded by the
//! configured width) and merged in prefix order, so the result does not
//! depend on which listing finished first.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::FOLDER_PLACEHOLDER;
use crate::error::SourceResult;
use crate::traits::backend::StorageBackend;
use crate::traits::strategy::{AcquisitionStrategy, StrategyKind};
use crate::types::entry::{EntryMetadata, ListOptions, ListedObject, RawStorageEntry};

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_CONCURRENCY: usize = 4;

/// Longest trailing `.ext` still treated as a file extension.
const MAX_EXTENSION_LEN: usize = 5;

/// Walks the bucket through the directory listing boundary.
pub struct StorageTraversal {
    backend: Arc<dyn StorageBackend>,
    bucket: String,
    page_size: usize,
    concurrency: usize,
}

impl StorageTraversal {
    pub fn new(backend: Arc<dyn StorageBackend>, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Entries requested per listing call (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Directory listings in flight at once (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Every object directly under `prefix`, following pages until a short one.
    async fn list_all(&self, prefix: &str) -> SourceResult<Vec<ListedObject>> {
        let mut objects = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .backend
                .list_directory(
                    &self.bucket,
                    prefix,
                    ListOptions {
                        offset,
                        limit: self.page_size,
                    },
                )
                .await?;
            let count = page.len();
            objects.extend(page);

            if count < self.page_size {
                break;
            }
            offset += count;
        }

        debug!(prefix, objects = objects.len(), "Listed directory");
        Ok(objects)
    }
}

#[async_trait]
impl AcquisitionStrategy for StorageTraversal {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StorageTraversal
    }

    async fn acquire(&self) -> SourceResult<Vec<RawStorageEntry>> {
        let mut visited: HashSet<String> = HashSet::from([String::new()]);
        let mut level = vec![String::new()];
        let mut files = Vec::new();
        let mut depth = 0usize;

        while !level.is_empty() {
            debug!(depth, directories = level.len(), "Traversing storage level");

            let mut listings: Vec<(String, SourceResult<Vec<ListedObject>>)> =
                stream::iter(level.into_iter().map(|prefix| async move {
                    let result = self.list_all(&prefix).await;
                    (prefix, result)
                }))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
            listings.sort_by(|a, b| a.0.cmp(&b.0));

            let mut next = Vec::new();
            for (prefix, result) in listings {
                // Any listing error fails the traversal. No partial catalogs.
                let objects = match result {
                    Ok(objects) => objects,
                    Err(e) => {
                        warn!(prefix = %prefix, error = %e, "Directory listing failed");
                        return Err(e);
                    }
                };

                for object in objects {
                    let name = object.name.trim_matches('/');
                    if name.is_empty() || name == FOLDER_PLACEHOLDER {
                        continue;
                    }
                    let path = join_path(&prefix, name);

                    if looks_like_file(&object) {
                        files.push(entry_from_listing(path, object));
                    } else if visited.insert(path.clone()) {
                        next.push(path);
                    }
                }
            }

            level = next;
            depth += 1;
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        info!(files = files.len(), depth, "Storage traversal finished");
        Ok(files)
    }
}

/// Folder-vs-file heuristic for directory listing entries.
///
/// A file reports a byte size or a MIME type, or at least carries a short
/// alphanumeric extension. Everything else is treated as a folder. A real
/// file with neither metadata nor an extension is misread as an (empty)
/// folder.
pub fn looks_like_file(object: &ListedObject) -> bool {
    let has_metadata = object
        .metadata
        .as_ref()
        .map(|m| m.has_size() || m.has_mime_type())
        .unwrap_or(false);

    has_metadata || has_extension(&object.name)
}

fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && (1..=MAX_EXTENSION_LEN).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn entry_from_listing(path: String, object: ListedObject) -> RawStorageEntry {
    let mut metadata = object.metadata.unwrap_or_default();
    if metadata.created_at.is_none() {
        metadata.created_at = object.created_at;
    }
    if metadata.updated_at.is_none() {
        metadata.updated_at = object.updated_at;
    }

    let entry = RawStorageEntry::new(path);
    let entry = if metadata == EntryMetadata::default() {
        entry
    } else {
        entry.with_metadata(metadata)
    };
    match object.id {
        Some(id) => entry.with_id(id),
        None => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::testing::{BackendCall, MockBackend, MockFailure};

    fn traversal(mock: &MockBackend) -> StorageTraversal {
        StorageTraversal::new(Arc::new(mock.clone()), "resources")
    }

    #[tokio::test]
    async fn test_walks_nested_folders() {
        let mock = MockBackend::new()
            .with_file("MTMTheFutureToday/forms/CMR/worksheet.pdf", 2048)
            .with_file("MTMTheFutureToday/training/intro.mp4", 4096)
            .with_file("TimeMyMeds/resources/guide.pdf", 1024)
            .with_file("root.pdf", 10);

        let entries = traversal(&mock).acquire().await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "MTMTheFutureToday/forms/CMR/worksheet.pdf",
                "MTMTheFutureToday/training/intro.mp4",
                "TimeMyMeds/resources/guide.pdf",
                "root.pdf",
            ]
        );
        assert_eq!(entries[0].name, "worksheet.pdf");
        assert_eq!(entries[0].metadata.as_ref().and_then(|m| m.size), Some(2048));
    }

    #[tokio::test]
    async fn test_empty_bucket_and_empty_folders() {
        let mock = MockBackend::new()
            .with_listing("", vec![ListedObject::folder("Empty")])
            .with_listing("Empty", vec![ListedObject::folder(FOLDER_PLACEHOLDER)]);

        let entries = traversal(&mock).acquire().await.unwrap();
        assert!(entries.is_empty());

        let entries = traversal(&MockBackend::new()).acquire().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let mut mock = MockBackend::new();
        for i in 0..5 {
            mock = mock.with_file(format!("docs/file-{}.pdf", i), 100);
        }

        let entries = traversal(&mock).with_page_size(2).acquire().await.unwrap();
        assert_eq!(entries.len(), 5);

        let docs_offsets: Vec<usize> = mock
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::ListDirectory { prefix, offset, .. } if prefix == "docs" => {
                    Some(offset)
                }
                _ => None,
            })
            .collect();
        assert_eq!(docs_offsets, vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_output_independent_of_concurrency() {
        let mut mock = MockBackend::new();
        for program in ["A", "B", "C", "D", "E"] {
            for folder in ["forms", "training"] {
                mock = mock.with_file(format!("{}/{}/doc.pdf", program, folder), 1);
            }
        }

        let serial = traversal(&mock).with_concurrency(1).acquire().await.unwrap();
        let wide = traversal(&mock).with_concurrency(8).acquire().await.unwrap();
        assert_eq!(serial, wide);
        assert_eq!(serial.len(), 10);
    }

    #[tokio::test]
    async fn test_subdirectory_failure_fails_traversal() {
        let mock = MockBackend::new()
            .with_file("ok/a.pdf", 1)
            .with_file("broken/b.pdf", 1)
            .with_listing_failure("broken", MockFailure::Http(500));

        let err = traversal(&mock).acquire().await.unwrap_err();
        assert!(matches!(err, SourceError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_nested_network_failure_fails_traversal() {
        let mock = MockBackend::new()
            .with_file("TimeMyMeds/forms/a.pdf", 1)
            .with_file("TestAndTreat/forms/b.pdf", 1)
            .with_listing_failure("TestAndTreat/forms", MockFailure::Network);

        let err = traversal(&mock).acquire().await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }

    #[tokio::test]
    async fn test_root_failure_fails_traversal() {
        let mock = MockBackend::new()
            .with_file("ok/a.pdf", 1)
            .with_listing_failure("", MockFailure::Http(503));

        let err = traversal(&mock).acquire().await.unwrap_err();
        assert!(matches!(err, SourceError::Api { status: 503, .. }));
    }

    #[test]
    fn test_file_heuristic() {
        assert!(looks_like_file(&ListedObject::file("README", "id", 12)));
        assert!(looks_like_file(&ListedObject::folder("worksheet.pdf")));
        assert!(looks_like_file(&ListedObject {
            name: "notes".into(),
            metadata: Some(EntryMetadata {
                mime_type: Some("text/plain".into()),
                ..Default::default()
            }),
            ..Default::default()
        }));

        assert!(!looks_like_file(&ListedObject::folder("forms")));
        assert!(!looks_like_file(&ListedObject::folder("v1.strange-ext")));
        assert!(!looks_like_file(&ListedObject::folder(".hidden")));
    }

    #[test]
    fn test_listing_timestamps_fill_metadata() {
        let object = ListedObject {
            name: "a.pdf".into(),
            id: None,
            metadata: None,
            created_at: Some("2024-01-01T00:00:00Z".into()),
            updated_at: Some("2024-02-01T00:00:00Z".into()),
        };
        let entry = entry_from_listing("x/a.pdf".into(), object);

        assert_eq!(entry.identity(), "x/a.pdf");
        let metadata = entry.metadata.unwrap();
        assert_eq!(metadata.updated_at.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(metadata.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }
}
