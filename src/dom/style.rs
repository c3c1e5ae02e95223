//! Inline style declarations and inherited typography.

use super::tags;
use super::{Document, NodeId};

/// Default root font size in logical pixels.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Properties that affect glyph metrics. Their resolved values form the
/// style key.
pub const TYPOGRAPHY_PROPERTIES: &[&str] = &[
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "font-variant",
    "font-feature-settings",
    "font-variation-settings",
    "font-kerning",
    "font-stretch",
    "font-variant-ligatures",
    "letter-spacing",
    "word-spacing",
    "text-transform",
    "direction",
    "writing-mode",
];

/// Effective `display` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Display {
    Block,
    #[default]
    Inline,
    InlineBlock,
    Contents,
    None,
}

impl Display {
    #[must_use]
    pub fn is_block(self) -> bool {
        self == Self::Block
    }
}

pub(super) fn display_of(doc: &Document, id: NodeId) -> Display {
    let Some(tag) = doc.tag(id) else {
        return Display::Inline;
    };
    if doc.attr(id, "hidden").is_some() {
        return Display::None;
    }
    if let Some(value) = doc.style_property(id, "display") {
        match value.as_str() {
            "block" | "flex" | "grid" | "list-item" | "table" | "flow-root" => {
                return Display::Block;
            }
            "inline-block" | "inline-flex" | "inline-grid" | "inline-table" => {
                return Display::InlineBlock;
            }
            "contents" => return Display::Contents,
            "none" => return Display::None,
            "inline" => return Display::Inline,
            _ => {}
        }
    }
    if tags::is_block(tag) {
        Display::Block
    } else if tags::is_non_text(tag) {
        Display::None
    } else {
        Display::Inline
    }
}

pub(super) fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name, value.to_string()))
        })
        .collect()
}

pub(super) fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a CSS length relative to `font_size`.
///
/// Supports `px`, `em`, `rem`, `%` and a bare `0`.
#[must_use]
pub fn parse_length(value: &str, font_size: f32) -> Option<f32> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    if let Some(n) = value.strip_suffix("px") {
        return n.trim().parse().ok();
    }
    if let Some(n) = value.strip_suffix("rem") {
        return n.trim().parse::<f32>().ok().map(|v| v * DEFAULT_FONT_SIZE);
    }
    if let Some(n) = value.strip_suffix("em") {
        return n.trim().parse::<f32>().ok().map(|v| v * font_size);
    }
    if let Some(n) = value.strip_suffix('%') {
        return n.trim().parse::<f32>().ok().map(|v| v / 100.0 * font_size);
    }
    None
}

/// Format a pixel value with at most three decimals.
#[must_use]
pub fn format_px(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let mut text = format!("{rounded:.3}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    if text == "-0" {
        text = "0".to_string();
    }
    format!("{text}px")
}

/// Typography resolved through inheritance.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub font_style: String,
    pub font_variant: String,
    pub font_feature_settings: String,
    pub font_variation_settings: String,
    pub font_kerning: String,
    pub font_stretch: String,
    pub font_variant_ligatures: String,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub text_transform: String,
    pub direction: String,
    pub writing_mode: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            font_family: "serif".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: 400,
            font_style: "normal".to_string(),
            font_variant: "normal".to_string(),
            font_feature_settings: "normal".to_string(),
            font_variation_settings: "normal".to_string(),
            font_kerning: "auto".to_string(),
            font_stretch: "normal".to_string(),
            font_variant_ligatures: "normal".to_string(),
            letter_spacing: 0.0,
            word_spacing: 0.0,
            text_transform: "none".to_string(),
            direction: "ltr".to_string(),
            writing_mode: "horizontal-tb".to_string(),
        }
    }
}

impl ComputedStyle {
    /// Resolve the style of `id`. Text nodes resolve through their parent.
    #[must_use]
    pub fn resolve(doc: &Document, id: NodeId) -> Self {
        let mut chain = Vec::new();
        let mut current = if doc.is_text(id) { doc.parent(id) } else { Some(id) };
        while let Some(node) = current {
            chain.push(node);
            current = doc.parent(node);
        }

        let mut style = Self::default();
        for &node in chain.iter().rev() {
            let Some(tag) = doc.tag(node) else {
                continue;
            };
            let parent_size = style.font_size;
            style.apply_tag_defaults(tag, parent_size);
            if let Some(inline) = doc.attr(node, "style") {
                for (name, value) in parse_declarations(inline) {
                    style.apply(&name, &value, parent_size);
                }
            }
        }
        style
    }

    fn apply_tag_defaults(&mut self, tag: &str, parent_size: f32) {
        match tag {
            "b" | "strong" | "th" => self.font_weight = 700,
            "em" | "i" | "cite" | "var" | "dfn" => "italic".clone_into(&mut self.font_style),
            "code" | "kbd" | "samp" | "pre" => "monospace".clone_into(&mut self.font_family),
            "small" | "sub" | "sup" => self.font_size = parent_size * 0.83,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.font_weight = 700;
                let scale = match tag {
                    "h1" => 2.0,
                    "h2" => 1.5,
                    "h3" => 1.17,
                    "h4" => 1.0,
                    "h5" => 0.83,
                    _ => 0.67,
                };
                self.font_size = parent_size * scale;
            }
            _ => {}
        }
    }

    fn apply(&mut self, name: &str, value: &str, parent_size: f32) {
        if value == "inherit" {
            return;
        }
        match name {
            "font-family" => value.clone_into(&mut self.font_family),
            "font-size" => {
                if let Some(size) = parse_length(value, parent_size) {
                    self.font_size = size;
                }
            }
            "font-weight" => {
                self.font_weight = match value {
                    "normal" => 400,
                    "bold" => 700,
                    "bolder" => (self.font_weight + 300).min(900),
                    "lighter" => self.font_weight.saturating_sub(300).max(100),
                    other => other.parse().unwrap_or(self.font_weight),
                };
            }
            "font-style" => value.clone_into(&mut self.font_style),
            "font-variant" => value.clone_into(&mut self.font_variant),
            "font-feature-settings" => value.clone_into(&mut self.font_feature_settings),
            "font-variation-settings" => value.clone_into(&mut self.font_variation_settings),
            "font-kerning" => value.clone_into(&mut self.font_kerning),
            "font-stretch" => value.clone_into(&mut self.font_stretch),
            "font-variant-ligatures" => value.clone_into(&mut self.font_variant_ligatures),
            "letter-spacing" => {
                self.letter_spacing = if value == "normal" {
                    0.0
                } else {
                    parse_length(value, self.font_size).unwrap_or(self.letter_spacing)
                };
            }
            "word-spacing" => {
                self.word_spacing = if value == "normal" {
                    0.0
                } else {
                    parse_length(value, self.font_size).unwrap_or(self.word_spacing)
                };
            }
            "text-transform" => value.clone_into(&mut self.text_transform),
            "direction" => value.clone_into(&mut self.direction),
            "writing-mode" => value.clone_into(&mut self.writing_mode),
            _ => {}
        }
    }

    /// Whether glyphs are italic or oblique.
    #[must_use]
    pub fn is_italic(&self) -> bool {
        self.font_style != "normal"
    }

    /// Fingerprint of every metric-affecting property.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.font_family,
            self.font_size,
            self.font_weight,
            self.font_style,
            self.font_variant,
            self.font_feature_settings,
            self.font_variation_settings,
            self.font_kerning,
            self.font_stretch,
            self.font_variant_ligatures,
            self.letter_spacing,
            self.word_spacing,
            self.text_transform,
            self.direction,
            self.writing_mode,
        )
    }

    /// Inline declarations that reproduce this typography on another element.
    #[must_use]
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        vec![
            ("font-family", self.font_family.clone()),
            ("font-size", format_px(self.font_size)),
            ("font-weight", self.font_weight.to_string()),
            ("font-style", self.font_style.clone()),
            ("font-variant", self.font_variant.clone()),
            ("font-feature-settings", self.font_feature_settings.clone()),
            ("font-variation-settings", self.font_variation_settings.clone()),
            ("font-kerning", self.font_kerning.clone()),
            ("font-stretch", self.font_stretch.clone()),
            ("font-variant-ligatures", self.font_variant_ligatures.clone()),
            ("letter-spacing", format_px(self.letter_spacing)),
            ("word-spacing", format_px(self.word_spacing)),
            ("text-transform", self.text_transform.clone()),
            ("direction", self.direction.clone()),
            ("writing-mode", self.writing_mode.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length_units() {
        assert_eq!(parse_length("12px", 16.0), Some(12.0));
        assert_eq!(parse_length("0.5em", 20.0), Some(10.0));
        assert_eq!(parse_length("2rem", 10.0), Some(32.0));
        assert_eq!(parse_length("50%", 16.0), Some(8.0));
        assert_eq!(parse_length("0", 16.0), Some(0.0));
        assert_eq!(parse_length("auto", 16.0), None);
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(1.5), "1.5px");
        assert_eq!(format_px(-0.0001), "0px");
        assert_eq!(format_px(2.0), "2px");
        assert_eq!(format_px(-1.28), "-1.28px");
    }

    #[test]
    fn test_inheritance_and_tag_defaults() {
        let doc = Document::from_html(
            "<h1 style=\"font-family: Inter\">A <strong>B <em style=\"font-size: 0.5em\">C</em></strong></h1>",
        );
        let h1 = doc.children(doc.root())[0];
        let strong = doc.children(h1)[1];
        let em = doc.children(strong)[1];

        let h1_style = doc.computed_style(h1);
        assert_eq!(h1_style.font_size, 32.0);
        assert_eq!(h1_style.font_weight, 700);
        assert_eq!(h1_style.font_family, "Inter");

        let em_style = doc.computed_style(em);
        assert_eq!(em_style.font_size, 16.0);
        assert!(em_style.is_italic());
        assert_eq!(em_style.font_family, "Inter");
    }

    #[test]
    fn test_text_node_resolves_through_parent() {
        let doc = Document::from_html("<p style=\"letter-spacing: 0.1em\">x</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];
        assert!((doc.computed_style(text).letter_spacing - 1.6).abs() < 1e-4);
    }

    #[test]
    fn test_key_changes_with_typography() {
        let mut doc = Document::from_html("<p>x</p>");
        let p = doc.children(doc.root())[0];
        let before = doc.computed_style(p).key();
        doc.set_style_property(p, "color", "red");
        assert_eq!(doc.computed_style(p).key(), before);
        doc.set_style_property(p, "font-weight", "bold");
        assert_ne!(doc.computed_style(p).key(), before);
    }

    #[test]
    fn test_display_resolution() {
        let doc = Document::from_html(
            "<div></div><span></span><span style=\"display: inline-block\"></span><p hidden></p>",
        );
        let kids = doc.children(doc.root()).to_vec();
        assert_eq!(doc.display(kids[0]), Display::Block);
        assert_eq!(doc.display(kids[1]), Display::Inline);
        assert_eq!(doc.display(kids[2]), Display::InlineBlock);
        assert_eq!(doc.display(kids[3]), Display::None);
    }
}
