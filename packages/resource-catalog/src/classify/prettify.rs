//! Folder-name prettifying for category labels.

/// Domain phrases the generic transform would mangle.
///
/// Keys are lowercase with separators removed (see [`squash`]).
const OVERRIDES: &[(&str, &str)] = &[
    ("flowsheets", "Flow Sheets"),
    ("medicationflowsheets", "Medication Flow Sheets"),
    ("hba1c", "HbA1c"),
    ("a1c", "A1C"),
    ("pgx", "PGx"),
    ("mtm", "MTM"),
    ("soapnotes", "SOAP Notes"),
    ("faq", "FAQ"),
    ("faqs", "FAQs"),
];

/// Turn a raw path segment into a display label.
///
/// `med_flowSheets-v2` → `Med Flow Sheets V2`. Known domain phrases are
/// looked up first and win over the generic transform.
pub fn prettify_segment(segment: &str) -> String {
    let key = squash(segment);
    if let Some((_, label)) = OVERRIDES.iter().find(|(k, _)| *k == key) {
        return (*label).to_string();
    }

    let mut spaced = String::with_capacity(segment.len() + 4);
    let mut prev: Option<char> = None;
    for c in segment.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if let Some(p) = prev {
            if p.is_lowercase() && c.is_uppercase() {
                spaced.push(' ');
            }
        }
        spaced.push(c);
        prev = Some(c);
    }

    spaced
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prettify each segment and join them with `" / "`.
///
/// Returns `None` when there is nothing left to show.
pub fn join_category<'a>(segments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let parts: Vec<String> = segments
        .into_iter()
        .map(prettify_segment)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" / "))
    }
}

/// Lowercased letters and digits (any script), everything else dropped.
/// Matching key for folder names and type labels.
pub fn squash(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
