//! Text Helpers

/// Marker appended to text cut by [`truncate_chars`].
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Cut `text` to at most `max_chars` characters, appending the truncation
/// marker when anything was removed. Never splits a UTF-8 character.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER), true),
        None => (text.to_string(), false),
    }
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
