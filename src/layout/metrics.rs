//! Font metrics used by the flow layout.

use crate::dom::ComputedStyle;
use crate::unicode::is_wide;

/// Resolved font selection for a run of glyphs.
#[derive(Clone, Debug, PartialEq)]
pub struct FontKey {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

impl FontKey {
    #[must_use]
    pub fn from_style(style: &ComputedStyle) -> Self {
        Self {
            family: style.font_family.clone(),
            size: style.font_size,
            weight: style.font_weight,
            italic: style.is_italic(),
        }
    }

    fn is_monospace(&self) -> bool {
        self.family.contains("monospace")
    }
}

/// Per-grapheme advance widths and pairwise kerning.
pub trait FontMetrics {
    /// Advance width of a single grapheme.
    fn advance(&self, grapheme: &str, font: &FontKey) -> f32;

    /// Kerning adjustment applied between two adjacent graphemes.
    fn kern(&self, left: &str, right: &str, font: &FontKey) -> f32;
}

/// Kerning pairs in em units.
const KERNING_PAIRS: &[(&str, &str, f32)] = &[
    ("A", "V", -0.08),
    ("A", "W", -0.06),
    ("A", "T", -0.07),
    ("A", "Y", -0.07),
    ("A", "v", -0.04),
    ("F", "a", -0.05),
    ("L", "T", -0.09),
    ("L", "V", -0.08),
    ("L", "Y", -0.08),
    ("P", "a", -0.04),
    ("T", "a", -0.08),
    ("T", "e", -0.09),
    ("T", "o", -0.09),
    ("T", "y", -0.06),
    ("V", "A", -0.08),
    ("V", "a", -0.06),
    ("V", "e", -0.06),
    ("W", "A", -0.06),
    ("W", "a", -0.05),
    ("W", "o", -0.05),
    ("Y", "A", -0.07),
    ("Y", "o", -0.08),
    ("Y", " ", -0.03),
    ("r", ".", -0.05),
    ("y", ".", -0.05),
    ("v", ".", -0.04),
    ("f", "f", -0.02),
    (" ", "A", -0.04),
];

/// Deterministic proportional metrics with a classic kerning-pair table.
///
/// Advances are fractions of the font size, so most sizes produce
/// sub-pixel widths. Monospace families advance 0.6em and never kern.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleMetrics;

impl SimpleMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn factor(grapheme: &str) -> f32 {
        let Some(c) = grapheme.chars().next() else {
            return 0.0;
        };
        match c {
            ' ' | '\u{a0}' => 0.27,
            'i' | 'l' | '.' | ',' | ';' | ':' | '\'' | '|' | '!' => 0.28,
            'j' | '/' => 0.3,
            'I' => 0.33,
            'f' | 't' | 'r' | '-' => 0.36,
            'm' => 0.85,
            'w' => 0.75,
            'M' | 'W' => 0.9,
            '\u{2014}' | '\u{2015}' => 1.0,
            '\u{2013}' | '\u{2012}' => 0.55,
            'A'..='Z' => 0.68,
            'a'..='z' => 0.52,
            '0'..='9' => 0.55,
            _ if is_wide(grapheme) => 1.0,
            _ => 0.6,
        }
    }
}

impl FontMetrics for SimpleMetrics {
    fn advance(&self, grapheme: &str, font: &FontKey) -> f32 {
        if font.is_monospace() {
            let cells = if is_wide(grapheme) { 1.2 } else { 0.6 };
            return cells * font.size;
        }
        let weight_scale = 1.0 + (f32::from(font.weight) - 400.0) / 3000.0;
        let slant_scale = if font.italic { 0.97 } else { 1.0 };
        Self::factor(grapheme) * font.size * weight_scale * slant_scale
    }

    fn kern(&self, left: &str, right: &str, font: &FontKey) -> f32 {
        if font.is_monospace() {
            return 0.0;
        }
        KERNING_PAIRS
            .iter()
            .find(|(l, r, _)| *l == left && *r == right)
            .map_or(0.0, |(_, _, em)| em * font.size)
    }
}
