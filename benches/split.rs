//! Split pipeline performance benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{Criterion, criterion_group, criterion_main};
use kernsplit::split::{collect, line_fingerprint};
use kernsplit::{Document, FlowLayout, SplitOptions, SplitType, split, split_to_tree};
use std::hint::black_box;

const PARAGRAPH: &str = "AVATAR To Yo, WAVE Tea. The quick brown fox jumps over the lazy dog \
     while <em>very <b>bold</b> words</em> wrap and/or continue\u{2014}onward.";

fn paragraph_html(repeat: usize) -> String {
    let body = vec![PARAGRAPH; repeat].join(" ");
    format!("<div style=\"width: 480px\"><p>{body}</p></div>")
}

fn host(doc: &Document) -> kernsplit::NodeId {
    let wrapper = doc.children(doc.root())[0];
    doc.children(wrapper)[0]
}

fn collect_text(c: &mut Criterion) {
    let doc = Document::from_html(&paragraph_html(8));
    let p = host(&doc);
    let options = SplitOptions::default();

    c.bench_function("collect_8_paragraphs", |b| {
        b.iter(|| collect(black_box(&doc), p, &options.break_chars));
    });
}

fn split_granularities(c: &mut Criterion) {
    let layout = FlowLayout::simple(1024.0);
    let html = paragraph_html(2);

    for (name, split_type) in [
        ("split_chars_words_lines", SplitType::all()),
        ("split_words_lines", SplitType::WORDS | SplitType::LINES),
        ("split_lines_only", SplitType::LINES),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut doc = Document::from_html(&html);
                let p = host(&doc);
                let options = SplitOptions::new().with_type(split_type);
                let mut session = split(&mut doc, &layout, p, options).unwrap_or_else(|e| panic!("{e}"));
                session.revert(&mut doc);
                black_box(doc.revision())
            });
        });
    }

    c.bench_function("split_without_kerning", |b| {
        b.iter(|| {
            let mut doc = Document::from_html(&html);
            let p = host(&doc);
            let options = SplitOptions::new().with_kerning(false);
            black_box(split(&mut doc, &layout, p, options).map(|s| s.chars().len()))
        });
    });
}

fn data_only(c: &mut Criterion) {
    let layout = FlowLayout::simple(1024.0);
    let mut doc = Document::from_html(&paragraph_html(2));
    let p = host(&doc);
    let options = SplitOptions::default();

    c.bench_function("split_to_tree", |b| {
        b.iter(|| black_box(split_to_tree(&mut doc, &layout, p, &options).map(|t| t.lines.len())));
    });

    let lines: Vec<String> = (0..40).map(|i| format!("line {i}  caf\u{e9}  text")).collect();
    c.bench_function("line_fingerprint_40", |b| {
        b.iter(|| line_fingerprint(black_box(&lines)));
    });
}

criterion_group!(benches, collect_text, split_granularities, data_only);
criterion_main!(benches);
