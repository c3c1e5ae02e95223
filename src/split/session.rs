//! Split sessions: the entry points and the adaptive resplit loop.

use super::collect::{Collected, collect};
use super::kerning::{apply_kerning, clear_kerning, clear_line_starts};
use super::lines::detect_lines;
use super::measure::measure_root;
use super::options::{Granularity, SplitOptions};
use super::render::{Rendered, RenderedWord, build_lines, finish_accessibility, render};
use super::scheduler::{FrameWork, Scheduler, SessionState, observation_targets};
use super::tree::{SplitTree, TreeNode, line_fingerprint};
use crate::dom::{Document, NodeId, format_px, tags};
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log, warn};
use crate::layout::LayoutEngine;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// The three output collections of a split, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitResult {
    pub chars: Vec<NodeId>,
    pub words: Vec<NodeId>,
    pub lines: Vec<NodeId>,
}

impl SplitResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.words.is_empty() && self.lines.is_empty()
    }
}

/// Settlement state of a [`Completion`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompletionState {
    #[default]
    Pending,
    Resolved,
    Rejected(String),
}

/// Shared, settle-once handle for work started from `on_split` (typically
/// an animation). Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct Completion(Rc<RefCell<CompletionState>>);

impl Completion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self) {
        self.settle(CompletionState::Resolved);
    }

    pub fn reject(&self, reason: impl Into<String>) {
        self.settle(CompletionState::Rejected(reason.into()));
    }

    fn settle(&self, state: CompletionState) {
        let mut current = self.0.borrow_mut();
        if *current == CompletionState::Pending {
            *current = state;
        }
    }

    #[must_use]
    pub fn state(&self) -> CompletionState {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        *self.0.borrow() != CompletionState::Pending
    }
}

/// Pre-split state of the host.
#[derive(Debug)]
struct Snapshot {
    /// Original children, detached and owned by the session.
    children: Vec<NodeId>,
    style: Option<String>,
    aria_label: Option<String>,
}

impl Snapshot {
    fn take(doc: &mut Document, host: NodeId) -> Self {
        Self {
            style: doc.attr(host, "style").map(str::to_string),
            aria_label: doc.attr(host, "aria-label").map(str::to_string),
            children: doc.take_children(host),
        }
    }

    /// Put the original children and attributes back.
    fn restore(self, doc: &mut Document, host: NodeId) {
        doc.clear_children(host);
        for child in self.children {
            doc.append_child(host, child);
        }
        restore_attr(doc, host, "style", self.style.as_deref());
        restore_attr(doc, host, "aria-label", self.aria_label.as_deref());
    }

    /// Fill the host with fresh copies of the original children.
    fn clone_into(&self, doc: &mut Document, host: NodeId) {
        doc.clear_children(host);
        for &child in &self.children {
            if let Some(copy) = doc.clone_subtree(child) {
                doc.append_child(host, copy);
            }
        }
    }
}

fn restore_attr(doc: &mut Document, node: NodeId, name: &str, value: Option<&str>) {
    match value {
        Some(value) => doc.set_attr(node, name, value),
        None => doc.remove_attr(node, name),
    }
}

fn validate_host(doc: &Document, host: NodeId) -> Result<()> {
    if !doc.contains(host) {
        return Err(Error::UnknownNode(host));
    }
    if !doc.is_element(host) {
        return Err(Error::NotAnElement(host));
    }
    Ok(())
}

/// `aria-label` for hosts that take one and have no inline formatting.
fn accessible_label(doc: &Document, host: NodeId, collected: &Collected) -> Option<String> {
    let labelable = doc.tag(host).is_some_and(tags::is_labelable);
    (labelable && !collected.track_ancestors).then(|| doc.plain_text(host))
}

/// Render, compensate, and regroup into the (already emptied) host.
fn run_pipeline(
    doc: &mut Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
    collected: &Collected,
    options: &SplitOptions,
    label: Option<&str>,
    snapshot: &[NodeId],
) -> Rendered {
    let mut rendered = render(doc, host, collected, options);
    if !options.disable_kerning && !options.split_type.is_lines_only() {
        apply_kerning(doc, layout, host, &rendered.words);
    }
    if options.has(Granularity::Lines) {
        let groups = detect_lines(doc, layout, host, &rendered.words);
        build_lines(doc, host, &mut rendered, &collected.ancestors, &groups, options);
        clear_line_starts(doc, &rendered.words, &groups);
    }
    finish_accessibility(doc, host, &mut rendered, label, snapshot);
    emit_log(
        LogLevel::Debug,
        &format!(
            "split {host}: {} chars, {} words, {} lines",
            rendered.result.chars.len(),
            rendered.result.words.len(),
            rendered.result.lines.len()
        ),
    );
    rendered
}

fn texts(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes.iter().map(|&n| doc.text_content(n)).collect()
}

/// Split into a detached description and restore the host immediately.
fn split_tree_in_place(
    doc: &mut Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
    options: &SplitOptions,
) -> SplitTree {
    let collected = collect(doc, host, &options.break_chars);
    if collected.words.is_empty() {
        warn("no text content to split");
        return SplitTree::default();
    }
    let label = accessible_label(doc, host, &collected);
    let snapshot = Snapshot::take(doc, host);
    let rendered = run_pipeline(
        doc,
        layout,
        host,
        &collected,
        options,
        label.as_deref(),
        &snapshot.children,
    );

    let tree = SplitTree {
        nodes: doc
            .children(host)
            .iter()
            .filter_map(|&n| TreeNode::from_document(doc, n))
            .collect(),
        chars: texts(doc, &rendered.result.chars),
        words: texts(doc, &rendered.result.words),
        lines: texts(doc, &rendered.result.lines),
    };
    snapshot.restore(doc, host);
    tree
}

/// Data-only split: measure and split `host`, return the generated tree as
/// data, and leave the host exactly as it was.
///
/// # Errors
///
/// [`Error::UnknownNode`] or [`Error::NotAnElement`] for an invalid host.
pub fn split_to_tree(
    doc: &mut Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
    options: &SplitOptions,
) -> Result<SplitTree> {
    validate_host(doc, host)?;
    let options = options.clone().normalized();
    Ok(split_tree_in_place(doc, layout, host, &options))
}

/// Split `host` in place and start a session.
///
/// Empty or whitespace-only content logs a warning and returns a session
/// with empty collections whose `revert` does nothing.
///
/// # Errors
///
/// [`Error::UnknownNode`] or [`Error::NotAnElement`] for an invalid host.
///
/// # Examples
///
/// ```
/// use kernsplit::dom::Document;
/// use kernsplit::layout::FlowLayout;
/// use kernsplit::split::{SplitOptions, split};
///
/// let mut doc = Document::from_html("<h1>Hello world</h1>");
/// let h1 = doc.children(doc.root())[0];
/// let layout = FlowLayout::simple(800.0);
///
/// let mut session = split(&mut doc, &layout, h1, SplitOptions::default()).unwrap();
/// assert_eq!(session.result().words.len(), 2);
/// assert_eq!(session.result().lines.len(), 1);
///
/// session.revert(&mut doc);
/// assert_eq!(doc.inner_html(h1), "Hello world");
/// ```
pub fn split(
    doc: &mut Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
    options: SplitOptions,
) -> Result<SplitText> {
    validate_host(doc, host)?;
    let options = options.normalized();

    let collected = collect(doc, host, &options.break_chars);
    if collected.words.is_empty() {
        warn("no text content to split");
        return Ok(SplitText::inert(host, options));
    }

    let label = accessible_label(doc, host, &collected);
    let snapshot = Snapshot::take(doc, host);
    let rendered = run_pipeline(
        doc,
        layout,
        host,
        &collected,
        &options,
        label.as_deref(),
        &snapshot.children,
    );

    let targets = if options.auto_split {
        let targets = observation_targets(doc, layout, host);
        if targets.is_empty() {
            warn("auto split needs a parent element to observe, responsive resplitting disabled");
        }
        targets
    } else {
        Vec::new()
    };
    let responsive = !targets.is_empty();
    let style_key = doc.computed_style(host).key();

    let mut session = SplitText {
        host,
        options,
        responsive,
        snapshot: Some(snapshot),
        label,
        result: SplitResult::default(),
        words: Vec::new(),
        sr_copy: None,
        scheduler: Scheduler::new(targets, style_key),
        completion: None,
    };
    session.install(rendered);

    if let Some(on_split) = session.options.on_split.clone() {
        session.completion = on_split(&session.result);
    }
    Ok(session)
}

/// A live split of one host element.
///
/// The host drives the session: report resizes through [`observe`] or
/// [`handle_resize`], advance time with [`poll`], and call [`on_frame`] once
/// per paint while the session is not disposed.
///
/// [`observe`]: SplitText::observe
/// [`handle_resize`]: SplitText::handle_resize
/// [`poll`]: SplitText::poll
/// [`on_frame`]: SplitText::on_frame
#[derive(Debug)]
pub struct SplitText {
    host: NodeId,
    options: SplitOptions,
    /// Resize-driven resplitting is active.
    responsive: bool,
    snapshot: Option<Snapshot>,
    label: Option<String>,
    result: SplitResult,
    words: Vec<RenderedWord>,
    sr_copy: Option<NodeId>,
    scheduler: Scheduler,
    completion: Option<Completion>,
}

impl SplitText {
    fn inert(host: NodeId, options: SplitOptions) -> Self {
        Self {
            host,
            options,
            responsive: false,
            snapshot: None,
            label: None,
            result: SplitResult::default(),
            words: Vec::new(),
            sr_copy: None,
            scheduler: Scheduler::disposed(),
            completion: None,
        }
    }

    fn install(&mut self, rendered: Rendered) {
        self.result = rendered.result;
        self.words = rendered.words;
        self.sr_copy = rendered.sr_copy;
    }

    #[must_use]
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Current collections. Replaced wholesale by every rebuild.
    #[must_use]
    pub fn result(&self) -> &SplitResult {
        &self.result
    }

    #[must_use]
    pub fn chars(&self) -> &[NodeId] {
        &self.result.chars
    }

    #[must_use]
    pub fn words(&self) -> &[NodeId] {
        &self.result.words
    }

    #[must_use]
    pub fn lines(&self) -> &[NodeId] {
        &self.result.lines
    }

    #[must_use]
    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Hidden copy kept for assistive technology, if any.
    #[must_use]
    pub fn screen_reader_copy(&self) -> Option<NodeId> {
        self.sr_copy
    }

    /// Elements whose resizes are acted on.
    #[must_use]
    pub fn observed_targets(&self) -> &[NodeId] {
        self.scheduler.targets()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.scheduler.state()
    }

    /// Whether work is queued for the next [`on_frame`](Self::on_frame).
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.scheduler.frame().is_some()
    }

    /// When the pending debounced rebuild becomes due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Line fingerprint of the current output.
    #[must_use]
    pub fn fingerprint(&self, doc: &Document) -> String {
        line_fingerprint(&texts(doc, &self.result.lines))
    }

    /// Read the current width of every observed target and report them as
    /// one batch: however many targets moved, at most one rebuild runs.
    pub fn observe(&mut self, doc: &mut Document, layout: &dyn LayoutEngine, now: Instant) {
        if !self.scheduler.is_observing() {
            return;
        }
        let widths: Vec<(NodeId, f32)> = self
            .scheduler
            .targets()
            .iter()
            .filter_map(|&t| layout.rect(doc, t).map(|r| (t, r.width)))
            .collect();
        self.resized(doc, layout, &widths, now);
    }

    /// Report one resize observation for `target`.
    pub fn handle_resize(
        &mut self,
        doc: &mut Document,
        layout: &dyn LayoutEngine,
        target: NodeId,
        width: f32,
        now: Instant,
    ) {
        self.resized(doc, layout, &[(target, width)], now);
    }

    fn resized(
        &mut self,
        doc: &mut Document,
        layout: &dyn LayoutEngine,
        widths: &[(NodeId, f32)],
        now: Instant,
    ) {
        if !self.responsive {
            return;
        }
        // Record every width before deciding; no short-circuit.
        let changed = widths
            .iter()
            .fold(false, |changed, &(target, width)| {
                self.scheduler.record_width(target, width) || changed
            });
        if !changed {
            return;
        }
        if self.options.resplit_debounce_ms == 0 {
            self.width_rebuild(doc, layout);
        } else {
            self.scheduler
                .arm(now, Duration::from_millis(self.options.resplit_debounce_ms));
        }
    }

    /// Run a due debounced rebuild and settle `revert_on_complete`.
    pub fn poll(&mut self, doc: &mut Document, layout: &dyn LayoutEngine, now: Instant) {
        self.settle_completion(doc);
        if self.scheduler.take_due(now) {
            self.width_rebuild(doc, layout);
        }
    }

    /// Per-paint callback: disconnection check, queued frame work, then the
    /// style-key comparison.
    pub fn on_frame(&mut self, doc: &mut Document, layout: &dyn LayoutEngine) {
        if self.scheduler.is_disposed() {
            return;
        }
        if !doc.is_connected(self.host) {
            warn("split element left the document, disposing");
            self.dispose();
            return;
        }

        match self.scheduler.take_frame() {
            Some(FrameWork::LineRebuild) => self.rebuild(doc, layout),
            Some(FrameWork::KerningRefresh) => self.refresh_kerning(doc, layout),
            None => {}
        }
        if self.scheduler.is_disposed() {
            return;
        }

        let key = doc.computed_style(self.host).key();
        if key != self.scheduler.style_key {
            self.scheduler.style_key = key;
            self.typography_changed();
        }
    }

    /// Fonts finished loading; glyph metrics may have changed.
    pub fn fonts_ready(&mut self) {
        if !self.scheduler.is_disposed() {
            self.typography_changed();
        }
    }

    fn typography_changed(&mut self) {
        if self.options.has(Granularity::Lines) {
            if self.responsive {
                self.scheduler.request_frame(FrameWork::LineRebuild);
            }
        } else if !self.options.disable_kerning {
            self.scheduler.request_frame(FrameWork::KerningRefresh);
        }
    }

    fn settle_completion(&mut self, doc: &mut Document) {
        if !self.options.revert_on_complete {
            return;
        }
        let Some(completion) = &self.completion else {
            return;
        };
        match completion.state() {
            CompletionState::Pending => return,
            CompletionState::Resolved => {}
            CompletionState::Rejected(reason) => {
                warn(&format!("split completion rejected: {reason}"));
            }
        }
        self.completion = None;
        self.revert(doc);
    }

    fn refresh_kerning(&mut self, doc: &mut Document, layout: &dyn LayoutEngine) {
        clear_kerning(doc, &self.words);
        apply_kerning(doc, layout, self.host, &self.words);
    }

    fn width_rebuild(&mut self, doc: &mut Document, layout: &dyn LayoutEngine) {
        if !doc.is_connected(self.host) {
            warn("split element left the document, disposing");
            self.dispose();
            return;
        }
        if self.options.has(Granularity::Lines) {
            if let Some(candidate) = self.speculative_fingerprint(doc, layout) {
                if candidate == self.fingerprint(doc) {
                    emit_log(
                        LogLevel::Debug,
                        "width changed but line grouping did not, keeping current split",
                    );
                    return;
                }
            }
        }
        self.rebuild(doc, layout);
    }

    /// Split a hidden copy of the host at its current width and return the
    /// resulting line fingerprint.
    fn speculative_fingerprint(
        &self,
        doc: &mut Document,
        layout: &dyn LayoutEngine,
    ) -> Option<String> {
        let snapshot = self.snapshot.as_ref()?;
        if self.host == doc.root() {
            return None;
        }
        let width = layout.rect(doc, self.host)?.width;
        let tag = doc.tag(self.host)?.to_string();
        let attrs = doc.attrs(self.host).to_vec();
        let declarations = doc.computed_style(self.host).declarations();

        let probe = doc.create_element(&tag);
        for attr in attrs
            .iter()
            .filter(|a| !matches!(a.name.as_str(), "style" | "id" | "aria-label"))
        {
            doc.set_attr(probe, &attr.name, &attr.value);
        }
        for (name, value) in &declarations {
            doc.set_style_property(probe, name, value);
        }
        doc.set_style_property(probe, "display", "block");
        doc.set_style_property(probe, "width", &format_px(width));
        doc.set_style_property(probe, "white-space", "normal");
        snapshot.clone_into(doc, probe);

        let root = measure_root(doc);
        doc.append_child(root, probe);
        let tree = split_tree_in_place(doc, layout, probe, &self.options);
        doc.free_subtree(probe);
        Some(tree.fingerprint())
    }

    /// Restore the original content and run the whole pipeline again.
    fn rebuild(&mut self, doc: &mut Document, layout: &dyn LayoutEngine) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        if !doc.is_connected(self.host) {
            warn("split element left the document, disposing");
            self.dispose();
            return;
        }
        self.scheduler.cancel_timer();

        snapshot.clone_into(doc, self.host);
        let collected = collect(doc, self.host, &self.options.break_chars);
        doc.clear_children(self.host);
        let rendered = run_pipeline(
            doc,
            layout,
            self.host,
            &collected,
            &self.options,
            self.label.as_deref(),
            &snapshot.children,
        );
        self.install(rendered);
        self.scheduler.style_key = doc.computed_style(self.host).key();

        if let Some(on_resplit) = self.options.on_resplit.clone() {
            on_resplit(&self.result);
        }
    }

    /// Restore the original content and attributes, then dispose.
    /// Ligatures stay disabled when characters were split. Idempotent.
    pub fn revert(&mut self, doc: &mut Document) {
        self.dispose();
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        if doc.is_element(self.host) {
            snapshot.restore(doc, self.host);
            if self.options.has(Granularity::Chars) {
                doc.set_style_property(self.host, "font-variant-ligatures", "none");
            }
        } else {
            for child in snapshot.children {
                doc.free_subtree(child);
            }
        }
        self.result = SplitResult::default();
        self.words.clear();
        self.sr_copy = None;
    }

    /// Stop observing and drop pending work without touching content.
    pub fn dispose(&mut self) {
        self.scheduler.dispose();
        self.responsive = false;
        self.completion = None;
    }
}
