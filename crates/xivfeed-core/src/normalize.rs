//! Search-key canonicalization.
//!
//! Search has to tolerate spacing and punctuation variance — "No Clippy!"
//! and "no clippy" are the same plugin. Keys keep only letters, digits,
//! and underscores, lowercased, so query-time matching is plain substring
//! containment over fields normalized once at merge time.

/// Lowercase `text` and strip every character that is not a Unicode
/// letter, digit, or underscore. Absent or empty input yields an empty
/// string.
pub fn normalize_for_search(text: Option<&str>) -> String {
    match text {
        Some(t) => t
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect(),
        None => String::new(),
    }
}
