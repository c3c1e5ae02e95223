//! Text normalization for line fingerprints.

use unicode_normalization::UnicodeNormalization;

/// Normalize `text` to NFC (canonical composition).
#[must_use]
pub fn normalize_nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Collapse whitespace runs to single spaces and trim the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFC-normalize and whitespace-collapse one line's text.
#[must_use]
pub fn normalize_line_text(text: &str) -> String {
    collapse_whitespace(&normalize_nfc(text))
}
