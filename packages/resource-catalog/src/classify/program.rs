//! Program tables: folder names, display metadata and name matching.

use crate::types::resource::Program;

use super::prettify::squash;

/// Static facts about one clinical program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramInfo {
    pub program: Program,
    /// Top-level bucket folder holding the program's files
    pub folder: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub const PROGRAMS: [ProgramInfo; 5] = [
    ProgramInfo {
        program: Program::Mtmtft,
        folder: "MTMTheFutureToday",
        name: "MTM The Future Today",
        description: "Medication therapy management workflows, CMR documentation and billing support.",
        icon: "clipboard-check",
    },
    ProgramInfo {
        program: Program::Tmm,
        folder: "TimeMyMeds",
        name: "TimeMyMeds",
        description: "Appointment-based medication synchronization for adherence programs.",
        icon: "calendar-clock",
    },
    ProgramInfo {
        program: Program::Tnt,
        folder: "TestAndTreat",
        name: "Test and Treat",
        description: "Point-of-care testing and treatment protocols for acute conditions.",
        icon: "stethoscope",
    },
    ProgramInfo {
        program: Program::A1c,
        folder: "HbA1cTesting",
        name: "HbA1c Testing",
        description: "Point-of-care HbA1c screening and diabetes follow-up.",
        icon: "droplet",
    },
    ProgramInfo {
        program: Program::Oc,
        folder: "OralContraceptives",
        name: "Oral Contraceptives",
        description: "Pharmacist-prescribed hormonal contraception services.",
        icon: "pill",
    },
];

/// Case-insensitive substring rules, checked in order.
const NAME_RULES: &[(&[&str], Program)] = &[
    (&["mtm", "future today"], Program::Mtmtft),
    (&["timemymeds", "time my meds"], Program::Tmm),
    (&["test and treat", "test & treat", "testandtreat"], Program::Tnt),
    (&["a1c"], Program::A1c),
    (&["contracept"], Program::Oc),
];

/// Display metadata for a clinical program (`None` for `general`).
pub fn program_info(program: Program) -> Option<&'static ProgramInfo> {
    PROGRAMS.iter().find(|info| info.program == program)
}

/// Match a top-level bucket folder against the program folder table.
///
/// Ignores case and separators, so `time-my-meds` matches `TimeMyMeds`.
pub fn program_for_folder(segment: &str) -> Option<Program> {
    let key = squash(segment);
    PROGRAMS
        .iter()
        .find(|info| squash(info.folder) == key)
        .map(|info| info.program)
}

/// Map a free-form program name to a slug.
///
/// Exact slugs are accepted as-is. Otherwise the first rule whose needle
/// occurs in the name wins; a name that matches no rule maps to the first
/// rule's program.
pub fn program_for_name(name: &str) -> Program {
    if let Some(program) = Program::from_clinical_slug(name) {
        return program;
    }

    let lowered = name.to_lowercase();
    NAME_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(_, program)| *program)
        .unwrap_or(NAME_RULES[0].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_clinical_program_has_info() {
        for program in Program::CLINICAL {
            assert!(program_info(program).is_some(), "{} missing", program);
        }
        assert!(program_info(Program::General).is_none());
    }

    #[test]
    fn test_folder_lookup() {
        assert_eq!(program_for_folder("MTMTheFutureToday"), Some(Program::Mtmtft));
        assert_eq!(program_for_folder("time-my-meds"), Some(Program::Tmm));
        assert_eq!(program_for_folder("programs"), None);
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(program_for_name("MTM The Future Today"), Program::Mtmtft);
        assert_eq!(program_for_name("TimeMyMeds"), Program::Tmm);
        assert_eq!(program_for_name("Test and Treat: Flu"), Program::Tnt);
        assert_eq!(program_for_name("HbA1c Testing"), Program::A1c);
        assert_eq!(program_for_name("Oral Contraceptives"), Program::Oc);
        assert_eq!(program_for_name("oc"), Program::Oc);
    }

    #[test]
    fn test_unmatched_name_defaults_to_first_rule() {
        assert_eq!(program_for_name("Something Else"), Program::Mtmtft);
    }
}
