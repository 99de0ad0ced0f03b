/// Zero-width and byte-order characters that carry no text but split tokens.
const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Build single-line search text for field patterns.
/// Drops control and zero-width characters, collapses every whitespace run
/// (carriage returns, tabs, newlines, full-width spaces) to one space.
pub fn collapse_whitespace(raw: &str) -> String {
    let visible: String = raw
        .chars()
        .filter(|c| !INVISIBLE.contains(c))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, on a character boundary.
/// Returns true when the text was shortened.
pub fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}
