//! Fuzz target for splitting arbitrary markup.
//!
//! Parses the input as a fragment, splits every top-level element, and checks
//! that revert restores each one.

#![no_main]

use kernsplit::{Document, FlowLayout, SplitOptions, split, split_to_tree};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let mut doc = Document::from_html(data);
    let layout = FlowLayout::simple(320.0);
    let root = doc.root();
    let hosts: Vec<_> = doc
        .children(root)
        .iter()
        .copied()
        .filter(|&n| doc.is_element(n))
        .collect();

    for host in hosts {
        let before = doc.inner_html(host);
        let _ = split_to_tree(&mut doc, &layout, host, &SplitOptions::default());
        assert_eq!(doc.inner_html(host), before);

        if let Ok(mut session) = split(&mut doc, &layout, host, SplitOptions::default()) {
            session.revert(&mut doc);
            assert_eq!(doc.inner_html(host), before);
        }
    }
});
