//! Canonical resource records and the closed label sets they use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classify::prettify::squash;

/// Clinical program a resource belongs to.
///
/// Five known program slugs plus `general` for resources with no program
/// signal at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    Mtmtft,
    Tmm,
    Tnt,
    A1c,
    Oc,
    General,
}

impl Program {
    /// The five clinical programs, excluding `general`.
    pub const CLINICAL: [Program; 5] = [
        Program::Mtmtft,
        Program::Tmm,
        Program::Tnt,
        Program::A1c,
        Program::Oc,
    ];

    /// Short stable identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Program::Mtmtft => "mtmtft",
            Program::Tmm => "tmm",
            Program::Tnt => "tnt",
            Program::A1c => "a1c",
            Program::Oc => "oc",
            Program::General => "general",
        }
    }

    /// Look up one of the five clinical slugs (case-insensitive).
    ///
    /// `general` is not a clinical slug and yields `None`.
    pub fn from_clinical_slug(slug: &str) -> Option<Program> {
        let slug = slug.trim();
        Self::CLINICAL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(slug))
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Program::General)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.slug())
    }
}

impl FromStr for Program {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("general") {
            return Ok(Program::General);
        }
        Program::from_clinical_slug(s).ok_or_else(|| format!("unknown program slug: {}", s))
    }
}

/// Kind of resource. Closed set of seven values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "Documentation Forms")]
    DocumentationForms,
    #[serde(rename = "Clinical Protocols")]
    ClinicalProtocols,
    #[serde(rename = "Additional Resources")]
    AdditionalResources,
    #[serde(rename = "Training Materials")]
    TrainingMaterials,
    #[serde(rename = "Patient Handouts")]
    PatientHandouts,
    #[serde(rename = "Clinical Guidelines")]
    ClinicalGuidelines,
    #[serde(rename = "Medical Billing")]
    MedicalBilling,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        ResourceType::DocumentationForms,
        ResourceType::ClinicalProtocols,
        ResourceType::AdditionalResources,
        ResourceType::TrainingMaterials,
        ResourceType::PatientHandouts,
        ResourceType::ClinicalGuidelines,
        ResourceType::MedicalBilling,
    ];

    /// Display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::DocumentationForms => "Documentation Forms",
            ResourceType::ClinicalProtocols => "Clinical Protocols",
            ResourceType::AdditionalResources => "Additional Resources",
            ResourceType::TrainingMaterials => "Training Materials",
            ResourceType::PatientHandouts => "Patient Handouts",
            ResourceType::ClinicalGuidelines => "Clinical Guidelines",
            ResourceType::MedicalBilling => "Medical Billing",
        }
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::AdditionalResources
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    /// Accepts the label in any case, with or without spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        Self::ALL
            .into_iter()
            .find(|t| squash(t.label()) == wanted)
            .ok_or_else(|| format!("unknown resource type: {}", s))
    }
}

/// One downloadable asset, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceItem {
    pub id: String,
    pub name: String,
    pub program: Program,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(rename = "sizeMB", skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<f64>,
    #[serde(rename = "lastUpdatedISO", skip_serializing_if = "Option::is_none")]
    pub last_updated_iso: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    /// Overlaid from the bookmark set at read time
    pub bookmarked: bool,
}

impl ResourceItem {
    /// Tags as a slice (empty when absent).
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    /// Text the free-form search runs against: name, category and tags.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.category.as_deref().unwrap_or(""),
            self.tag_list().join(" ")
        )
    }
}

/// A clinical program with the number of resources filed under it.
///
/// Derived from a loaded resource set; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalProgram {
    pub slug: Program,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub resource_count: usize,
}
