//! Off-screen text measurement.
//!
//! Probes are `inline-block` spans carrying an explicit copy of the
//! typography to measure, so measurement never depends on the live element's
//! own transforms or visibility. All probes of one request batch are written
//! first and read afterwards, then removed together.
//!
//! Probes live in one hidden measurement root per document, created on first
//! use and recreated if something detached or freed it. When the host is the
//! document root itself, probes go inside the host instead.

use crate::dom::{ComputedStyle, Document, NodeId};
use crate::layout::LayoutEngine;
use std::collections::HashMap;

/// Marker attribute of the shared measurement root.
pub(crate) const MEASURE_ROOT_ATTR: &str = "data-kernsplit-measure";

const MEASURE_ROOT_STYLE: &str =
    "position: absolute; visibility: hidden; white-space: nowrap; left: -9999px; top: 0px";

/// Probe text and size for strategy detection. The size is deliberately
/// fractional so precise engines return fractional widths.
const STRATEGY_PROBE_TEXT: &str = "ii";
const STRATEGY_PROBE_SIZE: &str = "13.37px";

/// How text widths are read from the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureStrategy {
    /// Text-range measurement. Fast.
    Range,
    /// Element box measurement. Used when ranges round to whole pixels.
    Element,
}

/// Per-document measurement state.
#[derive(Clone, Debug, Default)]
pub(crate) struct MeasureState {
    root: Option<NodeId>,
    strategy: Option<MeasureStrategy>,
}

/// Shared measurement root of `doc`, created or recreated as needed.
pub(crate) fn measure_root(doc: &mut Document) -> NodeId {
    if let Some(root) = doc.measure.root {
        let intact = doc.attr(root, MEASURE_ROOT_ATTR).is_some()
            && doc.parent(root) == Some(doc.root());
        if intact {
            return root;
        }
    }
    let root = doc.create_element_with(
        "div",
        &[(MEASURE_ROOT_ATTR, ""), ("aria-hidden", "true")],
    );
    doc.set_attr(root, "style", MEASURE_ROOT_STYLE);
    let body = doc.root();
    doc.append_child(body, root);
    doc.measure.root = Some(root);
    root
}

/// Where probes for `host` are placed.
fn probe_container(doc: &mut Document, host: NodeId) -> NodeId {
    if host == doc.root() {
        host
    } else {
        measure_root(doc)
    }
}

fn create_probe(doc: &mut Document, declarations: &[(&str, String)], text: &str) -> (NodeId, NodeId) {
    let probe = doc.create_element("span");
    for (name, value) in declarations {
        doc.set_style_property(probe, name, value);
    }
    doc.set_style_property(probe, "display", "inline-block");
    doc.set_style_property(probe, "white-space", "pre");
    doc.set_style_property(probe, "margin-left", "0px");
    let text_node = doc.create_text(text);
    doc.append_child(probe, text_node);
    (probe, text_node)
}

fn read_width(
    doc: &Document,
    layout: &dyn LayoutEngine,
    strategy: MeasureStrategy,
    probe: NodeId,
    text_node: NodeId,
) -> Option<f32> {
    match strategy {
        MeasureStrategy::Range => layout.range_width(doc, text_node),
        MeasureStrategy::Element => layout.rect(doc, probe).map(|r| r.width),
    }
}

/// Strategy for `doc`, probed once and remembered.
pub(crate) fn strategy(doc: &mut Document, layout: &dyn LayoutEngine, host: NodeId) -> MeasureStrategy {
    if let Some(strategy) = doc.measure.strategy {
        return strategy;
    }
    let container = probe_container(doc, host);
    let (probe, text_node) = create_probe(
        doc,
        &[("font-size", STRATEGY_PROBE_SIZE.to_string())],
        STRATEGY_PROBE_TEXT,
    );
    doc.append_child(container, probe);

    let range = layout.range_width(doc, text_node);
    let element = layout.rect(doc, probe).map(|r| r.width);
    doc.free_subtree(probe);

    let detected = match (range, element) {
        (Some(r), Some(e)) if r.fract() == 0.0 && e.fract() != 0.0 => MeasureStrategy::Element,
        (None, Some(_)) => MeasureStrategy::Element,
        _ => MeasureStrategy::Range,
    };
    // Only remember a verdict backed by real measurements.
    if range.is_some() || element.is_some() {
        doc.measure.strategy = Some(detected);
    }
    detected
}

/// Batched width measurement of text runs in given typography.
pub(crate) struct Measurer<'s> {
    requests: Vec<(&'s ComputedStyle, String)>,
    index: HashMap<(String, String), usize>,
}

impl<'s> Measurer<'s> {
    pub(crate) fn new() -> Self {
        Self {
            requests: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Queue `text` in `style`; returns a handle for [`Widths::get`].
    pub(crate) fn request(&mut self, style: &'s ComputedStyle, text: &str) -> usize {
        let key = (style.key(), text.to_string());
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.requests.len();
        self.requests.push((style, text.to_string()));
        self.index.insert(key, i);
        i
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Write all probes, read all widths, remove the probes.
    pub(crate) fn run(self, doc: &mut Document, layout: &dyn LayoutEngine, host: NodeId) -> Widths {
        let strategy = strategy(doc, layout, host);
        let container = probe_container(doc, host);

        let probes: Vec<(NodeId, NodeId)> = self
            .requests
            .iter()
            .map(|(style, text)| {
                let probe = create_probe(doc, &style.declarations(), text);
                doc.append_child(container, probe.0);
                probe
            })
            .collect();

        let widths = probes
            .iter()
            .map(|&(probe, text_node)| read_width(doc, layout, strategy, probe, text_node))
            .collect();

        for (probe, _) in probes {
            doc.free_subtree(probe);
        }
        Widths { widths }
    }
}

/// Results of a [`Measurer`] batch.
pub(crate) struct Widths {
    widths: Vec<Option<f32>>,
}

impl Widths {
    pub(crate) fn get(&self, handle: usize) -> Option<f32> {
        self.widths.get(handle).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FlowLayout;

    #[test]
    fn test_measure_root_is_reused_and_recreated() {
        let mut doc = Document::new();
        let a = measure_root(&mut doc);
        assert_eq!(measure_root(&mut doc), a);

        doc.free_subtree(a);
        let b = measure_root(&mut doc);
        assert!(doc.is_connected(b));
        assert!(doc.attr(b, MEASURE_ROOT_ATTR).is_some());
    }

    #[test]
    fn test_strategy_detection() {
        let mut doc = Document::from_html("<p>x</p>");
        let host = doc.children(doc.root())[0];
        let precise = FlowLayout::simple(500.0);
        assert_eq!(strategy(&mut doc, &precise, host), MeasureStrategy::Range);

        let mut doc = Document::from_html("<p>x</p>");
        let host = doc.children(doc.root())[0];
        let rounding = FlowLayout::simple(500.0).with_whole_pixel_ranges(true);
        assert_eq!(strategy(&mut doc, &rounding, host), MeasureStrategy::Element);
    }

    #[test]
    fn test_batch_measures_and_cleans_up() {
        let mut doc = Document::from_html("<p>AV</p>");
        let host = doc.children(doc.root())[0];
        let layout = FlowLayout::simple(500.0);
        let style = doc.computed_style(host);

        let mut measurer = Measurer::new();
        let a = measurer.request(&style, "A");
        let v = measurer.request(&style, "V");
        let av = measurer.request(&style, "AV");
        assert_eq!(measurer.request(&style, "A"), a);
        let widths = measurer.run(&mut doc, &layout, host);

        let delta = widths.get(av).unwrap() - widths.get(a).unwrap() - widths.get(v).unwrap();
        assert!(delta < -1.0);

        let root = measure_root(&mut doc);
        assert!(doc.children(root).is_empty());
    }

    #[test]
    fn test_in_place_when_host_is_root() {
        let mut doc = Document::from_html("AV");
        let host = doc.root();
        let layout = FlowLayout::simple(500.0);
        let style = doc.computed_style(host);
        let mut measurer = Measurer::new();
        let space = measurer.request(&style, " ");
        let widths = measurer.run(&mut doc, &layout, host);
        assert!(widths.get(space).unwrap() > 0.0);
        assert_eq!(doc.children(host).len(), 1);
    }
}
