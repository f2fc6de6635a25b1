/// Canonical comparable form of a token or text span.
///
/// Lowercases first, then drops every character that is neither a word
/// character (alphanumeric or `_`) nor whitespace. Whitespace is kept as-is.
/// Lowercasing before filtering keeps the function idempotent for characters
/// whose lowercase expansion contains combining marks (e.g. `İ`).
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|&ch| is_word_char(ch) || ch.is_whitespace())
        .collect()
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
