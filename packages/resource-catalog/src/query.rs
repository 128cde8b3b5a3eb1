//! Filtering, searching, sorting and paging over a loaded resource set.
//!
//! Pure: nothing here touches storage, and the input slice is never
//! reordered in place.

use std::cmp::Ordering;

use crate::types::filter::{ResourceFilters, SortField, SortOrder};
use crate::types::resource::ResourceItem;

/// Apply `filters` to `items`.
///
/// All predicates are ANDed. Sorting is stable, and `offset`/`limit` are
/// applied after filtering and sorting.
pub fn apply_filters(items: &[ResourceItem], filters: &ResourceFilters) -> Vec<ResourceItem> {
    let search = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let category = filters
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty());

    let mut matched: Vec<&ResourceItem> = items
        .iter()
        .filter(|item| {
            filters
                .program
                .as_ref()
                .map_or(true, |p| p.contains(&item.program))
        })
        .filter(|item| {
            filters
                .resource_type
                .as_ref()
                .map_or(true, |t| t.contains(&item.resource_type))
        })
        .filter(|item| category.map_or(true, |c| item.category.as_deref() == Some(c)))
        .filter(|item| has_every_tag(item, &filters.tags))
        .filter(|item| {
            search
                .as_deref()
                .map_or(true, |needle| item.search_text().to_lowercase().contains(needle))
        })
        .collect();

    // slice::sort_by is stable; descending flips the comparator rather than
    // reversing the output so ties keep their input order.
    matched.sort_by(|a, b| {
        let ordering = compare(a, b, filters.sort_by);
        match filters.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let limit = filters.limit.unwrap_or(usize::MAX);
    matched
        .into_iter()
        .skip(filters.offset)
        .take(limit)
        .cloned()
        .collect()
}

/// Tag filter is a strict AND, compared case-insensitively.
fn has_every_tag(item: &ResourceItem, wanted: &[String]) -> bool {
    let tags = item.tag_list();
    wanted
        .iter()
        .all(|w| tags.iter().any(|t| t.eq_ignore_ascii_case(w)))
}

/// Missing strings sort as `""`, missing counts as `0`.
fn compare(a: &ResourceItem, b: &ResourceItem, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::LastUpdated => a
            .last_updated_iso
            .as_deref()
            .unwrap_or("")
            .cmp(b.last_updated_iso.as_deref().unwrap_or("")),
        SortField::DownloadCount => a
            .download_count
            .unwrap_or(0)
            .cmp(&b.download_count.unwrap_or(0)),
        SortField::Category => a
            .category
            .as_deref()
            .unwrap_or("")
            .cmp(b.category.as_deref().unwrap_or("")),
    }
}
