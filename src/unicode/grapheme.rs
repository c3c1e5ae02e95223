//! Grapheme cluster iteration.

use unicode_segmentation::UnicodeSegmentation;

/// Iterate over extended grapheme clusters in a string.
///
/// Multi-codepoint emoji (ZWJ sequences, modifiers, flags) and base letters
/// with combining marks come out as a single item.
pub fn graphemes(s: &str) -> impl Iterator<Item = &str> {
    s.graphemes(true)
}

/// Whether a grapheme is whitespace (every scalar is whitespace).
#[must_use]
pub fn is_whitespace_grapheme(g: &str) -> bool {
    !g.is_empty() && g.chars().all(char::is_whitespace) && g != "\u{a0}"
}

/// Whether a grapheme is a single character from `break_chars`.
#[must_use]
pub fn is_break_grapheme(g: &str, break_chars: &[char]) -> bool {
    let mut chars = g.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => break_chars.contains(&c),
        _ => false,
    }
}
