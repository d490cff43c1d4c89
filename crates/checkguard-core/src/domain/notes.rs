/// Separator between accumulated incident notes.
pub const NOTES_SEPARATOR: &str = "\n";

/// Treats blank notes as absent. Line breaks inside a note become spaces so
/// one report is always one entry between separators.
pub fn normalize_note(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(value) if !value.trim().is_empty() => {
            Some(value.replace("\r\n", " ").replace(['\r', '\n'], " "))
        }
        _ => None,
    }
}

/// Combines the stored notes with a newly reported note, newest first.
///
/// This is the same rule the store applies inside its upsert statement.
pub fn merge_notes(existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    match (existing, incoming) {
        (None, incoming) => incoming.map(str::to_string),
        (Some(existing), None) => Some(existing.to_string()),
        (Some(existing), Some(incoming)) => {
            Some(format!("{incoming}{NOTES_SEPARATOR}{existing}"))
        }
    }
}
