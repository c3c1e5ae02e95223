//! Session lifecycle: width-driven resplits, debouncing, typography changes,
//! completion-driven revert, and disposal.

#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

mod common;

use common::{Fixture, capture_warnings};
use kernsplit::split::CompletionState;
use kernsplit::{Completion, SessionState, SplitOptions, SplitText, SplitType};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const WRAPPED: &str =
    "<div id=\"box\" style=\"width: 300px\"><p id=\"host\">aaaa bbbb cccc dddd</p></div>";

fn counting(options: SplitOptions) -> (SplitOptions, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    let options = options.with_on_resplit(move |_| seen.set(seen.get() + 1));
    (options, count)
}

fn resize(f: &mut Fixture, session: &mut SplitText, width: &str, now: Instant) {
    let target = f.by_id("box");
    f.doc.set_style_property(target, "width", width);
    session.observe(&mut f.doc, &f.layout, now);
}

// ============================================================================
// Observation targets
// ============================================================================

#[test]
fn coupled_parent_promotes_grandparent() {
    let mut f = Fixture::new(WRAPPED);
    let session = f.split(SplitOptions::new().with_auto_split(true));
    let root = f.doc.root();
    assert_eq!(session.observed_targets(), [f.by_id("box"), root]);
}

#[test]
fn auto_split_without_parent_warns() {
    let mut f = Fixture::new("Hello there");
    f.host = f.doc.root();

    let (session, warnings) = capture_warnings(|| f.split(SplitOptions::new().with_auto_split(true)));
    assert!(warnings.iter().any(|w| w.contains("parent")));
    assert!(session.observed_targets().is_empty());
    assert_eq!(session.words().len(), 2);
}

#[test]
fn no_observers_without_auto_split() {
    let mut f = Fixture::new(WRAPPED);
    let session = f.split(SplitOptions::default());
    assert!(session.observed_targets().is_empty());
}

// ============================================================================
// Width changes
// ============================================================================

#[test]
fn same_line_grouping_skips_rebuild() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(SplitOptions::new().with_auto_split(true).with_debounce_ms(0));
    let mut session = f.split(options);
    let t0 = Instant::now();
    session.observe(&mut f.doc, &f.layout, t0);

    let lines = session.lines().to_vec();
    let chars = session.chars().to_vec();
    resize(&mut f, &mut session, "200px", t0);

    assert_eq!(resplits.get(), 0);
    assert_eq!(session.lines(), lines.as_slice());
    assert_eq!(session.chars(), chars.as_slice());
    assert!(f.doc.is_connected(lines[0]));
    assert_eq!(session.state(), SessionState::Split);
}

#[test]
fn changed_line_grouping_rebuilds_once() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(SplitOptions::new().with_auto_split(true).with_debounce_ms(0));
    let mut session = f.split(options);
    let t0 = Instant::now();
    session.observe(&mut f.doc, &f.layout, t0);
    let old_lines = session.lines().to_vec();

    resize(&mut f, &mut session, "100px", t0);

    assert_eq!(resplits.get(), 1);
    assert_eq!(f.texts(session.lines()), ["aaaa bbbb", "cccc dddd"]);
    assert!(!f.doc.is_connected(old_lines[0]));
    assert_eq!(session.chars().len(), 16);
}

#[test]
fn sub_threshold_width_change_is_ignored() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(SplitOptions::new().with_auto_split(true).with_debounce_ms(0));
    let mut session = f.split(options);
    let t0 = Instant::now();
    session.observe(&mut f.doc, &f.layout, t0);
    resize(&mut f, &mut session, "300.4px", t0);
    assert_eq!(resplits.get(), 0);
    assert_eq!(session.state(), SessionState::Split);
}

#[test]
fn words_only_width_change_always_rebuilds() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(
        SplitOptions::new()
            .with_type(SplitType::WORDS)
            .with_auto_split(true)
            .with_debounce_ms(0),
    );
    let mut session = f.split(options);
    let t0 = Instant::now();
    session.observe(&mut f.doc, &f.layout, t0);
    resize(&mut f, &mut session, "250px", t0);
    assert_eq!(resplits.get(), 1);
    assert_eq!(f.texts(session.words()), ["aaaa", "bbbb", "cccc", "dddd"]);
}

#[test]
fn one_resize_moving_two_targets_rebuilds_once() {
    let mut f = Fixture::new(
        "<section id=\"outer\" style=\"width: 300px\">\
         <div id=\"box\"><p id=\"host\">aaaa bbbb cccc dddd</p></div></section>",
    );
    let (options, resplits) = counting(
        SplitOptions::new()
            .with_type(SplitType::WORDS)
            .with_auto_split(true)
            .with_debounce_ms(0),
    );
    let mut session = f.split(options);
    assert_eq!(session.observed_targets(), [f.by_id("box"), f.by_id("outer")]);
    let t0 = Instant::now();
    session.observe(&mut f.doc, &f.layout, t0);

    let outer = f.by_id("outer");
    f.doc.set_style_property(outer, "width", "250px");
    session.observe(&mut f.doc, &f.layout, t0);

    assert_eq!(resplits.get(), 1);
    assert_eq!(session.state(), SessionState::Split);
}

#[test]
fn debounced_batch_arms_one_deadline() {
    let mut f = Fixture::new(
        "<section id=\"outer\" style=\"width: 300px\">\
         <div id=\"box\"><p id=\"host\">aaaa bbbb cccc dddd</p></div></section>",
    );
    let (options, resplits) = counting(
        SplitOptions::new()
            .with_type(SplitType::WORDS)
            .with_auto_split(true)
            .with_debounce_ms(50),
    );
    let mut session = f.split(options);
    let t0 = Instant::now();
    session.observe(&mut f.doc, &f.layout, t0);

    let outer = f.by_id("outer");
    f.doc.set_style_property(outer, "width", "250px");
    session.observe(&mut f.doc, &f.layout, t0);
    assert_eq!(session.next_deadline(), Some(t0 + Duration::from_millis(50)));

    session.poll(&mut f.doc, &f.layout, t0 + Duration::from_millis(50));
    assert_eq!(resplits.get(), 1);
}

#[test]
fn debounce_waits_for_quiet_period() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(SplitOptions::new().with_auto_split(true).with_debounce_ms(100));
    let mut session = f.split(options);
    let t0 = Instant::now();
    let ms = Duration::from_millis;
    session.observe(&mut f.doc, &f.layout, t0);

    resize(&mut f, &mut session, "100px", t0 + ms(10));
    assert_eq!(session.state(), SessionState::PendingRefresh);
    assert_eq!(session.next_deadline(), Some(t0 + ms(110)));

    session.poll(&mut f.doc, &f.layout, t0 + ms(50));
    resize(&mut f, &mut session, "90px", t0 + ms(60));
    assert_eq!(session.next_deadline(), Some(t0 + ms(160)));

    session.poll(&mut f.doc, &f.layout, t0 + ms(120));
    assert_eq!(resplits.get(), 0);

    session.poll(&mut f.doc, &f.layout, t0 + ms(170));
    assert_eq!(resplits.get(), 1);
    assert_eq!(session.next_deadline(), None);
    assert_eq!(session.state(), SessionState::Split);
}

// ============================================================================
// Typography changes
// ============================================================================

#[test]
fn font_change_refreshes_kerning_without_lines() {
    let mut f = Fixture::new("<p>Y A</p>");
    let mut session = f.split(SplitOptions::new().with_type(SplitType::WORDS));
    let second = session.words()[1];
    assert!((f.margin(second) - (-1.12)).abs() < 0.01);

    f.doc.set_style_property(f.host, "font-size", "32px");
    session.on_frame(&mut f.doc, &f.layout);
    assert!(session.needs_frame());
    assert_eq!(session.state(), SessionState::PendingRefresh);

    session.on_frame(&mut f.doc, &f.layout);
    assert!(!session.needs_frame());
    assert_eq!(session.words()[1], second);
    assert!((f.margin(second) - (-2.24)).abs() < 0.01);
}

#[test]
fn font_change_with_lines_needs_auto_split() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(SplitOptions::default());
    let mut session = f.split(options);
    f.doc.set_style_property(f.host, "font-size", "24px");
    session.on_frame(&mut f.doc, &f.layout);
    assert!(!session.needs_frame());
    session.on_frame(&mut f.doc, &f.layout);
    assert_eq!(resplits.get(), 0);
}

#[test]
fn font_change_with_lines_rebuilds_on_next_frame() {
    let mut f = Fixture::new(WRAPPED);
    let (options, resplits) = counting(SplitOptions::new().with_auto_split(true));
    let mut session = f.split(options);
    f.doc.set_style_property(f.host, "font-size", "40px");
    session.on_frame(&mut f.doc, &f.layout);
    assert!(session.needs_frame());
    session.on_frame(&mut f.doc, &f.layout);
    assert_eq!(resplits.get(), 1);
    assert!(session.lines().len() > 1);
}

#[test]
fn fonts_ready_queues_refresh() {
    let mut f = Fixture::new("<p>AV</p>");
    let mut session = f.split(SplitOptions::new().with_type(SplitType::CHARS));
    session.fonts_ready();
    assert!(session.needs_frame());
    session.on_frame(&mut f.doc, &f.layout);
    assert!(!session.needs_frame());
    assert!(f.margin(session.chars()[1]) < 0.0);
}

// ============================================================================
// Completion and disposal
// ============================================================================

#[test]
fn revert_on_complete_waits_for_resolution() {
    let mut f = Fixture::new("<h1>Hello world</h1>");
    let before = f.doc.inner_html(f.host);
    let completion = Completion::new();
    let handle = completion.clone();
    let mut session = f.split(
        SplitOptions::new()
            .with_revert_on_complete(true)
            .with_on_split(move |result| {
                assert_eq!(result.words.len(), 2);
                Some(handle.clone())
            }),
    );
    let t0 = Instant::now();

    session.poll(&mut f.doc, &f.layout, t0);
    assert_ne!(f.doc.inner_html(f.host), before);

    completion.resolve();
    session.poll(&mut f.doc, &f.layout, t0);
    assert_eq!(f.doc.inner_html(f.host), before);
    assert_eq!(session.state(), SessionState::Disposed);
}

#[test]
fn rejected_completion_still_reverts() {
    let mut f = Fixture::new("<h1>Hello world</h1>");
    let before = f.doc.inner_html(f.host);
    let completion = Completion::new();
    let handle = completion.clone();
    let mut session = f.split(
        SplitOptions::new()
            .with_revert_on_complete(true)
            .with_on_split(move |_| Some(handle.clone())),
    );

    completion.reject("animation cancelled");
    completion.resolve();
    assert_eq!(
        completion.state(),
        CompletionState::Rejected("animation cancelled".to_string())
    );

    let ((), warnings) = capture_warnings(|| session.poll(&mut f.doc, &f.layout, Instant::now()));
    assert!(warnings.iter().any(|w| w.contains("animation cancelled")));
    assert_eq!(f.doc.inner_html(f.host), before);
}

#[test]
fn detached_host_disposes_on_frame() {
    let mut f = Fixture::new(WRAPPED);
    let mut session = f.split(SplitOptions::new().with_auto_split(true));
    let target = f.by_id("box");
    f.doc.detach(target);

    let ((), warnings) = capture_warnings(|| session.on_frame(&mut f.doc, &f.layout));
    assert!(!warnings.is_empty());
    assert_eq!(session.state(), SessionState::Disposed);
    assert!(session.observed_targets().is_empty());

    session.on_frame(&mut f.doc, &f.layout);
    assert_eq!(session.state(), SessionState::Disposed);
}

#[test]
fn dispose_keeps_output() {
    let mut f = Fixture::new(WRAPPED);
    let mut session = f.split(SplitOptions::new().with_auto_split(true).with_debounce_ms(0));
    let html = f.doc.inner_html(f.host);
    session.dispose();
    assert_eq!(session.state(), SessionState::Disposed);

    resize(&mut f, &mut session, "100px", Instant::now());
    assert_eq!(f.doc.inner_html(f.host), html);

    session.revert(&mut f.doc);
    assert_eq!(f.doc.inner_html(f.host), "aaaa bbbb cccc dddd");
}
