use std::sync::LazyLock;

use regex::Regex;

static RE_LINE_MARKERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[#>*\-\d.\s]+").unwrap());

/// Flattens a markdown export into plain text.
///
/// Each line loses its leading heading, quote, list and numbering markers, then
/// every `*` and `_` is dropped. Blank lines are kept so paragraphs survive.
pub fn markdown_to_plain_text(markdown: &str) -> String {
    markdown
        .lines()
        .map(|raw| {
            let line = raw.trim();
            if line.is_empty() {
                return String::new();
            }
            let line = RE_LINE_MARKERS.replace(line, "");
            line.replace(['*', '_'], "").trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
