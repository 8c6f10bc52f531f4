/// Canonical gene/TF symbol: trimmed, unquoted, uppercase.
///
/// Mouse (`Sox2`) and human (`SOX2`) spellings of the same symbol
/// collide on purpose; returns an empty string when nothing is left.
pub fn normalize_symbol(raw: &str) -> Box<str> {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .to_uppercase()
        .into_boxed_str()
}
