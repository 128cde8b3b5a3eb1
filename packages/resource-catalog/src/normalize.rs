//! Raw storage rows → canonical [`ResourceItem`]s.
//!
//! Never fails: every missing or malformed field has a defined default.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::classify::{classify, join_category, program_for_name};
use crate::types::config::StorageConfig;
use crate::types::entry::RawStorageEntry;
use crate::types::resource::{ResourceItem, ResourceType};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Extensions stripped from display names (compared case-insensitively).
const KNOWN_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv", "rtf", "png", "jpg", "jpeg",
    "gif", "mp4", "mp3", "zip",
];

/// Normalize one entry.
///
/// Program: an explicit `program_name` on the row beats the path. Category:
/// the row's `subcategory` beats the path. A row `category` that names a
/// resource type overrides the path-derived type.
pub fn normalize(entry: &RawStorageEntry, storage: &StorageConfig) -> ResourceItem {
    let classification = classify(&entry.path, entry.metadata.as_ref());

    let program = non_blank(entry.program_name.as_deref())
        .map(program_for_name)
        .unwrap_or(classification.program);

    let resource_type = non_blank(entry.category.as_deref())
        .and_then(|c| c.parse::<ResourceType>().ok())
        .unwrap_or(classification.resource_type);

    let category = non_blank(entry.subcategory.as_deref())
        .and_then(|sub| join_category(sub.split('/')))
        .or(classification.category);

    let tags = entry.tags.as_ref().and_then(|tags| {
        let cleaned: Vec<String> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        (!cleaned.is_empty()).then_some(cleaned)
    });

    let file_url = non_blank(entry.file_url.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| storage.public_url(&entry.path));

    let metadata = entry.metadata.as_ref();
    let size_mb = metadata.and_then(|m| m.size).and_then(bytes_to_mb);
    let last_updated_iso = metadata.and_then(|m| {
        non_blank(m.last_modified.as_deref())
            .or_else(|| non_blank(m.updated_at.as_deref()))
            .or_else(|| non_blank(m.created_at.as_deref()))
            .map(canonical_timestamp)
    });

    let raw_name = non_blank(Some(entry.name.as_str()))
        .or_else(|| entry.path.rsplit('/').find(|s| !s.is_empty()))
        .unwrap_or_default();

    ResourceItem {
        id: entry.identity().to_string(),
        name: strip_known_extension(raw_name).to_string(),
        program,
        resource_type,
        category,
        tags,
        file_url: Some(file_url),
        size_mb,
        last_updated_iso,
        download_count: entry.download_count,
        bookmarked: false,
    }
}

/// Normalize a whole load, keeping the first item for any repeated id.
pub fn normalize_all(entries: &[RawStorageEntry], storage: &StorageConfig) -> Vec<ResourceItem> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut items = Vec::with_capacity(entries.len());

    for entry in entries {
        let item = normalize(entry, storage);
        if seen.insert(item.id.clone()) {
            items.push(item);
        } else {
            debug!(id = %item.id, path = %entry.path, "Skipping duplicate resource id");
        }
    }

    items
}

/// Drop one known extension from a file name.
pub fn strip_known_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && KNOWN_EXTENSIONS.iter().any(|k| k.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    }
}

/// Bytes → megabytes rounded to two decimals; zero means unknown.
pub fn bytes_to_mb(bytes: u64) -> Option<f64> {
    if bytes == 0 {
        return None;
    }
    Some((bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0)
}

/// RFC 3339 timestamps are re-emitted in UTC with millisecond precision;
/// anything else is kept as given.
fn canonical_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entry::EntryMetadata;
    use crate::types::resource::Program;

    fn storage() -> StorageConfig {
        StorageConfig::new("https://store.example.org", "resources", "anon-key").unwrap()
    }

    #[test]
    fn test_worksheet_example() {
        let entry = RawStorageEntry::new("MTMTheFutureToday/forms/CMR/worksheet.pdf");
        let item = normalize(&entry, &storage());

        assert_eq!(item.program, Program::Mtmtft);
        assert_eq!(item.resource_type, ResourceType::DocumentationForms);
        assert_eq!(item.category.as_deref(), Some("Cmr"));
        assert_eq!(item.name, "worksheet");
        assert_eq!(item.id, "MTMTheFutureToday/forms/CMR/worksheet.pdf");
        assert_eq!(
            item.file_url.as_deref(),
            Some("https://store.example.org/storage/v1/object/public/resources/MTMTheFutureToday/forms/CMR/worksheet.pdf")
        );
        assert!(!item.bookmarked);
    }

    #[test]
    fn test_program_name_beats_path() {
        let entry = RawStorageEntry::new("TimeMyMeds/forms/a.pdf").with_program_name("Oral Contraceptives");
        assert_eq!(normalize(&entry, &storage()).program, Program::Oc);

        let entry = RawStorageEntry::new("loose.pdf").with_program_name("Test & Treat");
        assert_eq!(normalize(&entry, &storage()).program, Program::Tnt);

        let entry = RawStorageEntry::new("TimeMyMeds/forms/a.pdf").with_program_name("   ");
        assert_eq!(normalize(&entry, &storage()).program, Program::Tmm);
    }

    #[test]
    fn test_subcategory_beats_path_category() {
        let entry = RawStorageEntry::new("TimeMyMeds/forms/sync/a.pdf").with_subcategory("refill_reminders");
        let item = normalize(&entry, &storage());
        assert_eq!(item.category.as_deref(), Some("Refill Reminders"));
    }

    #[test]
    fn test_row_category_naming_a_type_overrides_path_type() {
        let mut entry = RawStorageEntry::new("TimeMyMeds/misc/a.pdf");
        entry.category = Some("Clinical Protocols".into());
        assert_eq!(
            normalize(&entry, &storage()).resource_type,
            ResourceType::ClinicalProtocols
        );

        entry.category = Some("whatever".into());
        assert_eq!(
            normalize(&entry, &storage()).resource_type,
            ResourceType::AdditionalResources
        );
    }

    #[test]
    fn test_direct_url_and_metadata() {
        let entry = RawStorageEntry::new("OralContraceptives/training/video.MP4")
            .with_id("row-1")
            .with_file_url("https://cdn.example.org/video.mp4")
            .with_tags(["  contraception ", "", "video"])
            .with_metadata(EntryMetadata {
                size: Some(5_500_000),
                last_modified: Some("2024-05-01T12:30:00+02:00".into()),
                ..Default::default()
            });
        let item = normalize(&entry, &storage());

        assert_eq!(item.id, "row-1");
        assert_eq!(item.name, "video");
        assert_eq!(item.file_url.as_deref(), Some("https://cdn.example.org/video.mp4"));
        assert_eq!(item.tags, Some(vec!["contraception".to_string(), "video".to_string()]));
        assert_eq!(item.size_mb, Some(5.25));
        assert_eq!(item.last_updated_iso.as_deref(), Some("2024-05-01T10:30:00.000Z"));
    }

    #[test]
    fn test_timestamp_fallbacks() {
        let entry = RawStorageEntry::new("a/b.pdf").with_metadata(EntryMetadata {
            created_at: Some("last tuesday".into()),
            ..Default::default()
        });
        assert_eq!(
            normalize(&entry, &storage()).last_updated_iso.as_deref(),
            Some("last tuesday")
        );
    }

    #[test]
    fn test_size_edge_cases() {
        assert_eq!(bytes_to_mb(0), None);
        assert_eq!(bytes_to_mb(1_048_576), Some(1.0));
        assert_eq!(bytes_to_mb(1_572_864), Some(1.5));
    }

    #[test]
    fn test_strip_known_extension() {
        assert_eq!(strip_known_extension("worksheet.pdf"), "worksheet");
        assert_eq!(strip_known_extension("Report.DOCX"), "Report");
        assert_eq!(strip_known_extension("archive.tar.gz"), "archive.tar.gz");
        assert_eq!(strip_known_extension("notes.v2.txt"), "notes.v2");
        assert_eq!(strip_known_extension(".pdf"), ".pdf");
        assert_eq!(strip_known_extension("README"), "README");
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let entry = RawStorageEntry::new("TestAndTreat/protocols/flu/protocol.pdf")
            .with_tags(["flu"])
            .with_metadata(EntryMetadata {
                size: Some(42_000),
                ..Default::default()
            });
        let first = serde_json::to_string(&normalize(&entry, &storage())).unwrap();
        let second = serde_json::to_string(&normalize(&entry, &storage())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let entries = vec![
            RawStorageEntry::new("a/first.pdf").with_id("same"),
            RawStorageEntry::new("a/second.pdf").with_id("same"),
            RawStorageEntry::new("a/third.pdf"),
        ];
        let items = normalize_all(&entries, &storage());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "first");
        assert_eq!(items[1].id, "a/third.pdf");
    }
}
