//! Contextual script detection.
//!
//! Glyphs in joining and shaping scripts change form with their neighbours,
//! so measuring them one at a time says nothing about how they render in a
//! run. Kerning compensation skips any run containing them.

use unicode_bidi::BidiClass;
use unicode_script::{Script, UnicodeScript};

/// Whether `script` joins or reorders glyphs contextually.
#[must_use]
pub fn is_contextual_script(script: Script) -> bool {
    matches!(
        script,
        Script::Arabic
            | Script::Hebrew
            | Script::Syriac
            | Script::Thaana
            | Script::Nko
            | Script::Mongolian
            | Script::Devanagari
            | Script::Bengali
            | Script::Gurmukhi
            | Script::Gujarati
            | Script::Oriya
            | Script::Tamil
            | Script::Telugu
            | Script::Kannada
            | Script::Malayalam
            | Script::Sinhala
            | Script::Thai
            | Script::Lao
            | Script::Tibetan
            | Script::Myanmar
            | Script::Khmer
    )
}

/// Whether any scalar in `text` belongs to a contextual script or is
/// strongly right-to-left.
#[must_use]
pub fn is_contextual(text: &str) -> bool {
    text.chars().any(|c| {
        is_contextual_script(c.script())
            || matches!(
                unicode_bidi::bidi_class(c),
                BidiClass::R | BidiClass::AL
            )
    })
}
