//! Property-based tests for splitting.
//!
//! Uses proptest to check that splitting preserves content and that revert
//! restores the host for arbitrary word sequences and formatting.

#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

mod common;

use common::Fixture;
use kernsplit::split::MAX_OFFSET;
use kernsplit::unicode::{graphemes, is_whitespace_grapheme};
use kernsplit::{SplitOptions, SplitType, split_to_tree};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Words without break characters, including kerning pairs and clusters.
fn word() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "AV", "To", "Yo", "WAVE", "hello", "caf\u{e9}", "e\u{301}te", "ff", "LT", "x", "\u{1F44D}",
        "na\u{ef}ve", "Tea.",
    ])
    .prop_map(str::to_string)
}

/// A word, optionally wrapped in inline formatting.
fn fragment() -> impl Strategy<Value = String> {
    (word(), 0..4u8).prop_map(|(w, wrap)| match wrap {
        0 => format!("<b>{w}</b>"),
        1 => format!("<em>{w}</em>"),
        _ => w,
    })
}

fn paragraph() -> impl Strategy<Value = (Vec<String>, String)> {
    prop::collection::vec(fragment(), 1..12).prop_map(|parts| {
        let html = format!("<p>{}</p>", parts.join(" "));
        (parts, html)
    })
}

fn split_type() -> impl Strategy<Value = SplitType> {
    (1u8..8).prop_map(SplitType::from_bits_truncate)
}

fn visible(text: &str) -> String {
    graphemes(text).filter(|g| !is_whitespace_grapheme(g)).collect()
}

// ============================================================================
// Split Properties
// ============================================================================

proptest! {
    /// Revert restores the original markup for any granularity.
    #[test]
    fn revert_restores_markup((_, html) in paragraph(), split_type in split_type()) {
        let mut f = Fixture::new(&html);
        let before = f.doc.inner_html(f.host);
        let mut session = f.split(SplitOptions::new().with_type(split_type));
        session.revert(&mut f.doc);
        prop_assert_eq!(f.doc.inner_html(f.host), before);
    }

    /// Characters concatenate to the visible graphemes of the source.
    #[test]
    fn chars_round_trip((_, html) in paragraph()) {
        let mut f = Fixture::new(&html);
        let source = f.doc.text_content(f.host);
        let session = f.split(SplitOptions::new().with_type(SplitType::CHARS));
        let joined: String = f.texts(session.chars()).concat();
        prop_assert_eq!(joined, visible(&source));
    }

    /// One word container per space-separated source word.
    #[test]
    fn one_word_per_fragment((parts, html) in paragraph()) {
        let mut f = Fixture::new(&html);
        let source = f.doc.plain_text(f.host);
        let session = f.split(SplitOptions::new().with_type(SplitType::WORDS | SplitType::LINES));
        prop_assert_eq!(session.words().len(), parts.len());
        let lines: String = f.texts(session.lines()).join(" ");
        prop_assert_eq!(visible(&lines), visible(&source));
    }

    /// Applied offsets stay strictly inside the bound.
    #[test]
    fn offsets_are_bounded((_, html) in paragraph(), size in 8u32..120) {
        let html = html.replacen("<p>", &format!("<p style=\"font-size: {size}px\">"), 1);
        let mut f = Fixture::new(&html);
        let session = f.split(SplitOptions::default());
        for &c in session.chars() {
            prop_assert!(f.margin(c).abs() < MAX_OFFSET);
        }
    }

    /// Data-only splitting never mutates the host.
    #[test]
    fn split_to_tree_is_pure((_, html) in paragraph(), split_type in split_type()) {
        let mut f = Fixture::new(&html);
        let before = f.doc.outer_html(f.host);
        let options = SplitOptions::new().with_type(split_type);
        let tree = split_to_tree(&mut f.doc, &f.layout, f.host, &options).unwrap();
        prop_assert_eq!(f.doc.outer_html(f.host), before);
        prop_assert!(!tree.nodes.is_empty());
    }
}
