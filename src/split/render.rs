//! Split tree construction.
//!
//! Builds char/word containers for collected words directly inside the host,
//! re-creating inline formatting wrappers around runs that share an ancestor
//! chain. A second pass regroups word units into line containers once line
//! membership is known.

use super::collect::{AncestorArena, AncestorId, Collected, common_prefix_len};
use super::options::{Granularity, SplitOptions};
use super::session::SplitResult;
use crate::dom::{Document, NodeId};

/// Class of the visually hidden copy kept for assistive technology.
pub const SR_ONLY_CLASS: &str = "kernsplit-sr-only";

const SR_ONLY_STYLE: &str = "position: absolute; width: 1px; height: 1px; padding: 0px; \
     margin: -1px; overflow: hidden; clip: rect(0, 0, 0, 0); white-space: nowrap; border: 0px";

/// A rendered word and what is needed to regroup and compensate it.
#[derive(Clone, Debug)]
pub(crate) struct RenderedWord {
    /// Word container, or an unclassed wrapper when words were not requested.
    pub(crate) unit: NodeId,
    /// Topmost node of the word (its mask, or the unit).
    pub(crate) outer: NodeId,
    pub(crate) chars: Vec<NodeId>,
    pub(crate) outer_chain: Vec<AncestorId>,
    pub(crate) no_space_before: bool,
    pub(crate) hard_break_before: bool,
}

impl RenderedWord {
    pub(crate) fn has_space_before(&self) -> bool {
        !self.no_space_before && !self.hard_break_before
    }
}

/// Output of one render pass.
#[derive(Clone, Debug, Default)]
pub(crate) struct Rendered {
    pub(crate) words: Vec<RenderedWord>,
    pub(crate) result: SplitResult,
    pub(crate) sr_copy: Option<NodeId>,
}

/// Open wrapper elements for the current position.
struct WrapperStack {
    base: NodeId,
    open: Vec<(AncestorId, NodeId)>,
}

impl WrapperStack {
    fn new(base: NodeId) -> Self {
        Self {
            base,
            open: Vec::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().map_or(self.base, |&(_, node)| node)
    }

    /// Close wrappers not in `chain`, open the missing ones, and return the
    /// innermost.
    fn sync(&mut self, doc: &mut Document, arena: &AncestorArena, chain: &[AncestorId]) -> NodeId {
        let keep = self
            .open
            .iter()
            .zip(chain)
            .take_while(|((open, _), wanted)| open == *wanted)
            .count();
        self.open.truncate(keep);

        for &id in &chain[keep..] {
            let Some(info) = arena.get(id) else {
                continue;
            };
            let wrapper = doc.create_element(&info.tag);
            for attr in &info.attrs {
                doc.set_attr(wrapper, &attr.name, &attr.value);
            }
            let parent = self.current();
            doc.append_child(parent, wrapper);
            self.open.push((id, wrapper));
        }
        self.current()
    }
}

fn decorate(
    doc: &mut Document,
    node: NodeId,
    options: &SplitOptions,
    granularity: Granularity,
    index: usize,
) {
    let class = options.class_for(granularity);
    if !class.is_empty() {
        doc.set_attr(node, "class", class);
    }
    let stem = granularity.stem();
    doc.set_attr(node, &format!("data-{stem}-index"), &index.to_string());
    let display = if granularity == Granularity::Lines {
        "block"
    } else {
        "inline-block"
    };
    doc.set_style_property(node, "display", display);
    if options.prop_index {
        doc.set_style_property(node, &format!("--{stem}-index"), &index.to_string());
    }
}

/// Wrap `node` in a clipping mask element.
fn mask(doc: &mut Document, node: NodeId, options: &SplitOptions, granularity: Granularity) -> NodeId {
    let wrapper = doc.create_element("span");
    let class = options.class_for(granularity);
    let class = if class.is_empty() {
        format!("split-{}-mask", granularity.stem())
    } else {
        format!("{class}-mask")
    };
    doc.set_attr(wrapper, "class", &class);
    let display = if granularity == Granularity::Lines {
        "block"
    } else {
        "inline-block"
    };
    doc.set_style_property(wrapper, "display", display);
    doc.set_style_property(wrapper, "overflow", "clip");
    doc.append_child(wrapper, node);
    wrapper
}

fn append_text(doc: &mut Document, parent: NodeId, text: &str) {
    if let Some(&last) = doc.children(parent).last() {
        if let Some(existing) = doc.text(last) {
            let merged = format!("{existing}{text}");
            doc.set_text(last, &merged);
            return;
        }
    }
    let node = doc.create_text(text);
    doc.append_child(parent, node);
}

fn append_separator(doc: &mut Document, parent: NodeId, hard_break: bool) {
    if hard_break {
        let br = doc.create_element("br");
        doc.append_child(parent, br);
    } else {
        append_text(doc, parent, " ");
    }
}

/// Build char/word containers for `collected` into the (empty) host.
pub(crate) fn render(
    doc: &mut Document,
    host: NodeId,
    collected: &Collected,
    options: &SplitOptions,
) -> Rendered {
    let chars_on = options.has(Granularity::Chars);
    let words_on = options.has(Granularity::Words);
    let arena = &collected.ancestors;

    if chars_on {
        doc.set_style_property(host, "font-variant-ligatures", "none");
    }

    let mut rendered = Rendered::default();
    let mut stack = WrapperStack::new(host);
    let mut previous_chain: &[AncestorId] = &[];

    for (wi, word) in collected.words.iter().enumerate() {
        let outer_chain = word.outer_chain();
        if wi > 0 && (word.hard_break_before || !word.no_space_before) {
            let shared = common_prefix_len(previous_chain, outer_chain);
            let parent = stack.sync(doc, arena, &outer_chain[..shared]);
            append_separator(doc, parent, word.hard_break_before);
        }
        let parent = stack.sync(doc, arena, outer_chain);

        let unit = doc.create_element("span");
        if words_on {
            decorate(doc, unit, options, Granularity::Words, rendered.result.words.len());
            rendered.result.words.push(unit);
        } else {
            doc.set_style_property(unit, "display", "inline-block");
        }
        let outer = if options.masks(Granularity::Words) {
            mask(doc, unit, options, Granularity::Words)
        } else {
            unit
        };
        doc.append_child(parent, outer);

        let mut inner = WrapperStack::new(unit);
        let mut chars = Vec::new();
        for ch in &word.chars {
            let inner_parent = inner.sync(doc, arena, &ch.ancestors[outer_chain.len()..]);
            if chars_on {
                let container = doc.create_element("span");
                decorate(doc, container, options, Granularity::Chars, rendered.result.chars.len());
                let text = doc.create_text(&ch.grapheme);
                doc.append_child(container, text);
                let node = if options.masks(Granularity::Chars) {
                    mask(doc, container, options, Granularity::Chars)
                } else {
                    container
                };
                doc.append_child(inner_parent, node);
                chars.push(container);
                rendered.result.chars.push(container);
            } else {
                append_text(doc, inner_parent, &ch.grapheme);
            }
        }

        rendered.words.push(RenderedWord {
            unit,
            outer,
            chars,
            outer_chain: outer_chain.to_vec(),
            no_space_before: word.no_space_before,
            hard_break_before: word.hard_break_before,
        });
        previous_chain = outer_chain;
    }

    rendered
}

/// Regroup word units into line containers, replacing the host's content.
pub(crate) fn build_lines(
    doc: &mut Document,
    host: NodeId,
    rendered: &mut Rendered,
    arena: &AncestorArena,
    groups: &[Vec<usize>],
    options: &SplitOptions,
) {
    for word in &rendered.words {
        doc.detach(word.outer);
    }
    doc.clear_children(host);

    for (li, group) in groups.iter().enumerate() {
        let line = doc.create_element("span");
        decorate(doc, line, options, Granularity::Lines, li);
        let outer = if options.masks(Granularity::Lines) {
            mask(doc, line, options, Granularity::Lines)
        } else {
            line
        };
        doc.append_child(host, outer);

        let mut stack = WrapperStack::new(line);
        let mut previous: Option<&RenderedWord> = None;
        for &wi in group {
            let Some(word) = rendered.words.get(wi) else {
                continue;
            };
            if let Some(prev) = previous {
                if word.has_space_before() {
                    let shared = common_prefix_len(&prev.outer_chain, &word.outer_chain);
                    let parent = stack.sync(doc, arena, &word.outer_chain[..shared]);
                    append_separator(doc, parent, false);
                }
            }
            let parent = stack.sync(doc, arena, &word.outer_chain);
            doc.append_child(parent, word.outer);
            previous = Some(word);
        }
        rendered.result.lines.push(line);
    }

    if options.split_type.is_lines_only() {
        for word in std::mem::take(&mut rendered.words) {
            unwrap(doc, word.unit);
        }
        for &line in &rendered.result.lines {
            doc.normalize(line);
        }
    }
}

/// Replace `node` with its children.
fn unwrap(doc: &mut Document, node: NodeId) {
    let Some(parent) = doc.parent(node) else {
        return;
    };
    for child in doc.take_children(node) {
        doc.insert_before(parent, child, Some(node));
    }
    doc.free_subtree(node);
}

/// Apply the accessibility mode once the final structure is in place.
///
/// With a `label`, the host gets `aria-label` and generated leaves are
/// hidden. Otherwise a hidden copy of `snapshot` is appended for assistive
/// technology and the visible generated tree is hidden.
pub(crate) fn finish_accessibility(
    doc: &mut Document,
    host: NodeId,
    rendered: &mut Rendered,
    label: Option<&str>,
    snapshot: &[NodeId],
) {
    if let Some(label) = label {
        doc.set_attr(host, "aria-label", label);
        let result = &rendered.result;
        let leaves = if !result.chars.is_empty() {
            &result.chars
        } else if !result.words.is_empty() {
            &result.words
        } else {
            &result.lines
        };
        for &leaf in leaves {
            doc.set_attr(leaf, "aria-hidden", "true");
        }
        return;
    }

    for child in doc.children(host).to_vec() {
        if doc.is_element(child) {
            doc.set_attr(child, "aria-hidden", "true");
        }
    }
    let copy = doc.create_element_with("span", &[("class", SR_ONLY_CLASS)]);
    doc.set_attr(copy, "style", SR_ONLY_STYLE);
    for &original in snapshot {
        if let Some(clone) = doc.clone_subtree(original) {
            doc.append_child(copy, clone);
        }
    }
    doc.append_child(host, copy);
    rendered.sr_copy = Some(copy);
}
