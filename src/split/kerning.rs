//! Kerning compensation.
//!
//! Splitting `AV` into two boxes loses the pair kerning the font applied
//! between them. For every adjacent pair inside a style-homogeneous run the
//! lost amount is `width("AV") - width("A") - width("V")`, applied as
//! `margin-left` on the second character. Across a rendered space the same
//! measurement is taken over `last + " " + first` and lands on the first
//! character of the next word, or on the word container itself when only
//! words are split.

use super::measure::Measurer;
use super::render::RenderedWord;
use crate::dom::{ComputedStyle, Document, NodeId, format_px};
use crate::event::{LogLevel, emit_log, warn};
use crate::layout::LayoutEngine;
use crate::unicode::{graphemes, is_contextual};
use std::collections::HashMap;

/// Offsets at or beyond this magnitude are treated as measurement noise.
pub const MAX_OFFSET: f32 = 20.0;

/// Offsets at or below this magnitude are not worth a style write.
const MIN_OFFSET: f32 = 0.001;

struct Glyph {
    /// Node that receives the offset.
    target: NodeId,
    text: String,
    style: usize,
}

struct Correction {
    target: NodeId,
    whole: usize,
    parts: Vec<usize>,
}

/// Measure and apply offsets for `words`. Returns how many nodes received
/// an offset.
pub(crate) fn apply_kerning(
    doc: &mut Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
    words: &[RenderedWord],
) -> usize {
    if !doc.is_connected(host) {
        warn("kerning skipped: element is not connected to the document");
        return 0;
    }

    let char_mode = words.iter().any(|w| !w.chars.is_empty());
    let mut styles: Vec<ComputedStyle> = Vec::new();
    let mut keys: Vec<String> = Vec::new();
    let mut intern_style = |style: ComputedStyle| -> usize {
        let key = style.key();
        if let Some(i) = keys.iter().position(|k| *k == key) {
            return i;
        }
        keys.push(key);
        styles.push(style);
        styles.len() - 1
    };

    let word_glyphs: Vec<Vec<Glyph>> = words
        .iter()
        .map(|word| {
            if char_mode {
                word.chars
                    .iter()
                    .map(|&c| Glyph {
                        target: c,
                        text: doc.text_content(c),
                        style: intern_style(doc.computed_style(c)),
                    })
                    .collect()
            } else {
                edge_glyphs(doc, word.unit, &mut intern_style)
            }
        })
        .collect();

    let mut measurer = Measurer::new();
    let mut corrections = Vec::new();

    for (wi, glyphs) in word_glyphs.iter().enumerate() {
        if char_mode {
            for pair in glyphs.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.style != b.style || is_contextual(&a.text) || is_contextual(&b.text) {
                    continue;
                }
                let style = &styles[a.style];
                corrections.push(Correction {
                    target: b.target,
                    whole: measurer.request(style, &format!("{}{}", a.text, b.text)),
                    parts: vec![measurer.request(style, &a.text), measurer.request(style, &b.text)],
                });
            }
        }

        if wi == 0 || !words[wi].has_space_before() {
            continue;
        }
        let (Some(last), Some(first)) = (word_glyphs[wi - 1].last(), glyphs.first()) else {
            continue;
        };
        if last.style != first.style || is_contextual(&last.text) || is_contextual(&first.text) {
            continue;
        }
        let style = &styles[last.style];
        corrections.push(Correction {
            target: first.target,
            whole: measurer.request(style, &format!("{} {}", last.text, first.text)),
            parts: vec![
                measurer.request(style, &last.text),
                measurer.request(style, " "),
                measurer.request(style, &first.text),
            ],
        });
    }

    if measurer.is_empty() {
        return 0;
    }
    let widths = measurer.run(doc, layout, host);

    let mut order: Vec<NodeId> = Vec::new();
    let mut offsets: HashMap<NodeId, f32> = HashMap::new();
    for correction in &corrections {
        let Some(whole) = widths.get(correction.whole) else {
            continue;
        };
        let Some(parts) = correction
            .parts
            .iter()
            .map(|&p| widths.get(p))
            .sum::<Option<f32>>()
        else {
            continue;
        };
        let delta = whole - parts;
        if delta.abs() >= MAX_OFFSET {
            continue;
        }
        if !offsets.contains_key(&correction.target) {
            order.push(correction.target);
        }
        *offsets.entry(correction.target).or_insert(0.0) += delta;
    }

    let mut applied = 0;
    for node in order {
        let total = offsets.get(&node).copied().unwrap_or(0.0);
        if total.abs() >= MAX_OFFSET || total.abs() <= MIN_OFFSET {
            continue;
        }
        doc.set_style_property(node, "margin-left", &format_px(total));
        applied += 1;
    }
    emit_log(
        LogLevel::Debug,
        &format!("kerning applied to {applied} of {} measured pairs", corrections.len()),
    );
    applied
}

/// First and last grapheme of a word container, each in its own style.
fn edge_glyphs(
    doc: &Document,
    unit: NodeId,
    intern_style: &mut impl FnMut(ComputedStyle) -> usize,
) -> Vec<Glyph> {
    let text_nodes: Vec<NodeId> = doc
        .descendants(unit)
        .into_iter()
        .filter(|&n| doc.text(n).is_some_and(|t| !t.is_empty()))
        .collect();
    let (Some(&first_node), Some(&last_node)) = (text_nodes.first(), text_nodes.last()) else {
        return Vec::new();
    };
    let first = doc.text(first_node).and_then(|t| graphemes(t).next());
    let last = doc.text(last_node).and_then(|t| graphemes(t).last());
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };
    vec![
        Glyph {
            target: unit,
            text: first.to_string(),
            style: intern_style(doc.computed_style(first_node)),
        },
        Glyph {
            target: unit,
            text: last.to_string(),
            style: intern_style(doc.computed_style(last_node)),
        },
    ]
}

/// Remove previously applied offsets without touching structure.
pub(crate) fn clear_kerning(doc: &mut Document, words: &[RenderedWord]) {
    for word in words {
        doc.remove_style_property(word.unit, "margin-left");
        for &c in &word.chars {
            doc.remove_style_property(c, "margin-left");
        }
    }
}

/// Drop cross-word offsets from words that open a line. A wrapped line has
/// no rendered space before its first word.
pub(crate) fn clear_line_starts(doc: &mut Document, words: &[RenderedWord], lines: &[Vec<usize>]) {
    for line in lines {
        let Some(word) = line.first().and_then(|&wi| words.get(wi)) else {
            continue;
        };
        if !word.has_space_before() {
            continue;
        }
        let target = word.chars.first().copied().unwrap_or(word.unit);
        doc.remove_style_property(target, "margin-left");
    }
}
