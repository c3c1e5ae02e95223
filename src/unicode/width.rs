//! East Asian display width, used by the built-in font metrics.

use unicode_width::UnicodeWidthStr;

/// Display width of a string in cells (ambiguous width = 1).
#[must_use]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Whether a grapheme occupies a full em box (wide or fullwidth).
#[must_use]
pub fn is_wide(grapheme: &str) -> bool {
    display_width(grapheme) >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(display_width("hello"), 5);
        assert!(!is_wide("a"));
    }

    #[test]
    fn test_cjk_width() {
        assert_eq!(display_width("漢字"), 4);
        assert!(is_wide("漢"));
    }

    #[test]
    fn test_emoji_width() {
        assert!(is_wide("😀"));
    }
}
