//! Raw storage rows, as produced by the acquisition strategies.
//!
//! The wire shapes (`CatalogRow`, `ProcedureRow`, `ListedObject`) mirror the
//! three storage boundaries. Each strategy converts its wire shape into the
//! common [`RawStorageEntry`].

use serde::{Deserialize, Deserializer, Serialize};

/// Object metadata as reported by storage.
///
/// Every field is optional; cheaper strategies supply fewer of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Size in bytes
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: Option<u64>,

    #[serde(default, rename = "mimetype", alias = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,

    #[serde(default, rename = "lastModified", alias = "last_modified")]
    pub last_modified: Option<String>,

    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,

    #[serde(default, rename = "updatedAt", alias = "updated_at")]
    pub updated_at: Option<String>,

    /// Sidecar program hint attached to the object, if any
    #[serde(default)]
    pub program: Option<String>,
}

impl EntryMetadata {
    /// Whether storage reported a byte size.
    pub fn has_size(&self) -> bool {
        self.size.is_some()
    }

    /// Whether storage reported a MIME type.
    pub fn has_mime_type(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| !m.trim().is_empty())
            .unwrap_or(false)
    }
}

/// One file discovered in the bucket, before classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStorageEntry {
    /// `/`-delimited object path inside the bucket
    pub path: String,

    /// File name (last path segment)
    pub name: String,

    /// Storage or catalog row id; the path stands in when absent
    pub id: Option<String>,

    /// Direct download URL (catalog rows only)
    pub file_url: Option<String>,

    pub metadata: Option<EntryMetadata>,

    /// Program named explicitly by the catalog
    pub program_name: Option<String>,

    pub category: Option<String>,

    pub subcategory: Option<String>,

    pub tags: Option<Vec<String>>,

    /// Download tally (catalog rows only)
    pub download_count: Option<u64>,
}

impl RawStorageEntry {
    /// Create an entry from a path; the name is its last segment.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            name,
            ..Default::default()
        }
    }

    /// Set the row id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the explicit program name.
    pub fn with_program_name(mut self, program: impl Into<String>) -> Self {
        self.program_name = Some(program.into());
        self
    }

    /// Set the subcategory.
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Set the direct file URL.
    pub fn with_file_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = Some(url.into());
        self
    }

    /// Stable identity: the row id when present and non-blank, else the path.
    pub fn identity(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => &self.path,
        }
    }

    /// Path split into non-empty segments.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Row of the catalog index table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: Option<String>,
    pub bucket_name: Option<String>,
    pub file_name: Option<String>,
    pub file_path: String,
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub last_modified: Option<String>,
    pub program_name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub download_count: Option<u64>,
}

impl From<CatalogRow> for RawStorageEntry {
    fn from(row: CatalogRow) -> Self {
        let name = row
            .file_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| row.file_path.rsplit('/').next().unwrap_or_default().to_string());

        let metadata = EntryMetadata {
            size: row.file_size,
            mime_type: row.mime_type,
            last_modified: row.last_modified,
            ..Default::default()
        };

        Self {
            path: row.file_path,
            name,
            id: row.id,
            file_url: row.file_url,
            metadata: Some(metadata),
            program_name: row.program_name,
            category: row.category,
            subcategory: row.subcategory,
            tags: row.tags,
            download_count: row.download_count,
        }
    }
}

/// Row returned by the server-side listing procedure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcedureRow {
    pub path: Option<String>,
    pub name: String,
    pub id: Option<String>,
    pub metadata: Option<EntryMetadata>,
}

impl From<ProcedureRow> for RawStorageEntry {
    fn from(row: ProcedureRow) -> Self {
        let path = row
            .path
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| row.name.clone());
        let name = path.rsplit('/').next().unwrap_or_default().to_string();

        Self {
            path,
            name,
            id: row.id,
            metadata: row.metadata,
            ..Default::default()
        }
    }
}

/// One entry of a single-level directory listing (file or folder).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListedObject {
    pub name: String,
    pub id: Option<String>,
    pub metadata: Option<EntryMetadata>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ListedObject {
    /// Create a listed object with just a name (how folders appear).
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a listed file with an id and a byte size.
    pub fn file(name: impl Into<String>, id: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            metadata: Some(EntryMetadata {
                size: Some(size),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Pagination controls for one directory listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub offset: usize,
    pub limit: usize,
}

/// Accept integers, integer-valued floats and numeric strings; anything else
/// becomes `None` instead of failing the whole response.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}
