//! Path grammar: storage path segments → program, type and category.

use serde::{Deserialize, Serialize};

use crate::types::entry::EntryMetadata;
use crate::types::resource::{Program, ResourceType};

use super::prettify::{join_category, squash};
use super::program::program_for_folder;

/// Top-level folders that map straight to a type regardless of program.
const TOP_LEVEL_TYPES: &[(&str, ResourceType)] = &[
    ("patienthandouts", ResourceType::PatientHandouts),
    ("clinicalguidelines", ResourceType::ClinicalGuidelines),
    ("medicalbilling", ResourceType::MedicalBilling),
];

/// Type folders found somewhere below a program folder.
const TYPE_FOLDERS: &[(&str, ResourceType)] = &[
    ("forms", ResourceType::DocumentationForms),
    ("protocols", ResourceType::ClinicalProtocols),
    ("resources", ResourceType::AdditionalResources),
    ("training", ResourceType::TrainingMaterials),
];

/// Legacy layout prefix: `programs/<slug>/...`.
const LEGACY_PROGRAMS_FOLDER: &str = "programs";

/// Labels derived from a storage path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub program: Program,
    pub resource_type: ResourceType,
    pub category: Option<String>,
}

/// Classify a `/`-delimited storage path.
pub fn classify(path: &str, metadata: Option<&EntryMetadata>) -> Classification {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let hint = metadata.and_then(|m| m.program.as_deref());
    classify_segments(&segments, hint)
}

/// Classify path segments (the last one being the file name).
///
/// Pure and total: every input yields a classification, and identical inputs
/// yield identical outputs.
pub fn classify_segments(segments: &[&str], program_hint: Option<&str>) -> Classification {
    let program = resolve_program(segments, program_hint);
    let (resource_type, category) = resolve_type(segments);

    Classification {
        program,
        resource_type,
        category,
    }
}

fn resolve_program(segments: &[&str], program_hint: Option<&str>) -> Program {
    if let Some(program) = program_hint.and_then(Program::from_clinical_slug) {
        return program;
    }

    let Some(first) = segments.first() else {
        return Program::General;
    };

    if let Some(program) = program_for_folder(first) {
        return program;
    }

    if first.eq_ignore_ascii_case(LEGACY_PROGRAMS_FOLDER) {
        if let Some(program) = segments.get(1).and_then(|s| Program::from_clinical_slug(s)) {
            return program;
        }
    }

    Program::General
}

fn resolve_type(segments: &[&str]) -> (ResourceType, Option<String>) {
    // Need at least one folder in front of the file name.
    if segments.len() < 2 {
        return (ResourceType::AdditionalResources, None);
    }
    let folders = &segments[..segments.len() - 1];

    let top = squash(folders[0]);
    if let Some((_, resource_type)) = TOP_LEVEL_TYPES.iter().find(|(k, _)| *k == top) {
        return (*resource_type, join_category(folders[1..].iter().copied()));
    }

    for (i, folder) in folders.iter().enumerate().skip(1) {
        let key = squash(folder);
        if let Some((_, resource_type)) = TYPE_FOLDERS.iter().find(|(k, _)| *k == key) {
            return (*resource_type, join_category(folders[i + 1..].iter().copied()));
        }
    }

    (ResourceType::AdditionalResources, None)
}
