//! Query filters for the resource set.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::resource::{Program, ResourceType};

/// A filter value given either as a single scalar or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: PartialEq> OneOrMany<T> {
    /// Membership test. An empty list matches nothing.
    pub fn contains(&self, value: &T) -> bool {
        match self {
            OneOrMany::One(v) => v == value,
            OneOrMany::Many(vs) => vs.contains(value),
        }
    }
}

/// Sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Name,
    LastUpdated,
    DownloadCount,
    Category,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "name" => Ok(SortField::Name),
            "lastupdated" => Ok(SortField::LastUpdated),
            "downloadcount" => Ok(SortField::DownloadCount),
            "category" => Ok(SortField::Category),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Caller-supplied filters. All optional; kinds combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilters {
    pub program: Option<OneOrMany<Program>>,
    #[serde(rename = "type")]
    pub resource_type: Option<OneOrMany<ResourceType>>,
    pub category: Option<String>,
    /// Every listed tag must be present on the item
    #[serde(default)]
    pub tags: Vec<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ResourceFilters {
    /// Empty filter (matches everything, sorted by name ascending).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single program.
    pub fn with_program(mut self, program: Program) -> Self {
        self.program = Some(OneOrMany::One(program));
        self
    }

    /// Restrict to any of several programs.
    pub fn with_programs(mut self, programs: impl IntoIterator<Item = Program>) -> Self {
        self.program = Some(OneOrMany::Many(programs.into_iter().collect()));
        self
    }

    /// Restrict to a single resource type.
    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(OneOrMany::One(resource_type));
        self
    }

    /// Restrict to any of several resource types.
    pub fn with_types(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        self.resource_type = Some(OneOrMany::Many(types.into_iter().collect()));
        self
    }

    /// Restrict to an exact category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Require all of these tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive search over name, category and tags.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Set sort key and direction.
    pub fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.sort_order = order;
        self
    }

    /// Window the sorted result.
    pub fn paginate(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_or_many_deserializes_both_shapes() {
        let filters: ResourceFilters = serde_json::from_value(json!({
            "program": ["tmm", "oc"],
            "type": "Clinical Protocols",
            "sortBy": "downloadCount",
            "sortOrder": "desc"
        }))
        .unwrap();

        assert_eq!(
            filters.program,
            Some(OneOrMany::Many(vec![Program::Tmm, Program::Oc]))
        );
        assert_eq!(
            filters.resource_type,
            Some(OneOrMany::One(ResourceType::ClinicalProtocols))
        );
        assert_eq!(filters.sort_by, SortField::DownloadCount);
        assert_eq!(filters.sort_order, SortOrder::Desc);
        assert_eq!(filters.offset, 0);
        assert_eq!(filters.limit, None);
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let none: OneOrMany<Program> = OneOrMany::Many(vec![]);
        assert!(!none.contains(&Program::Tmm));
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("last_updated".parse::<SortField>(), Ok(SortField::LastUpdated));
        assert_eq!("lastUpdated".parse::<SortField>(), Ok(SortField::LastUpdated));
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("size".parse::<SortField>().is_err());
    }
}
