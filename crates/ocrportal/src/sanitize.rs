//! Helpers for turning user-supplied names into safe storage names and for
//! keeping span attributes free of full paths.

use std::path::Path;

/// Longest filename (in characters, extension included) kept in storage keys.
const MAX_FILENAME_CHARS: usize = 150;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an uploaded filename to a single safe path component.
///
/// Directory parts are dropped (both `/` and `\` separators, since browsers on
/// Windows send full paths), control characters and reserved punctuation become
/// `_`, and an empty result falls back to `document.pdf`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();

    // A name made only of dots would resolve to the directory itself.
    if cleaned.trim_matches('.').is_empty() {
        return "document.pdf".to_string();
    }

    if cleaned.chars().count() > MAX_FILENAME_CHARS {
        let (stem, ext) = split_extension(&cleaned);
        let keep = MAX_FILENAME_CHARS.saturating_sub(ext.chars().count());
        cleaned = stem.chars().take(keep).collect::<String>() + ext;
    }

    cleaned
}

/// Returns the filename without its final extension (`scan.v2.pdf` → `scan.v2`).
pub fn file_stem(name: &str) -> &str {
    split_extension(name).0
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(pos) => (&name[..pos], &name[pos..]),
    }
}
