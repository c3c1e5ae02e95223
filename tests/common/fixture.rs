//! Document fixtures for split tests.

use kernsplit::dom::parse_length;
use kernsplit::{Document, FlowLayout, NodeId, SplitOptions, SplitText, split};

/// A parsed document, its host element, and a headless layout.
pub struct Fixture {
    pub doc: Document,
    pub layout: FlowLayout,
    pub host: NodeId,
}

impl Fixture {
    /// Parse `html` into an 800px viewport. The host is the element with
    /// `id="host"`, or the first top-level node.
    pub fn new(html: &str) -> Self {
        Self::with_viewport(html, 800.0)
    }

    pub fn with_viewport(html: &str, width: f32) -> Self {
        let doc = Document::from_html(html);
        let host = find_by_id(&doc, "host").unwrap_or_else(|| doc.children(doc.root())[0]);
        Self {
            doc,
            layout: FlowLayout::simple(width),
            host,
        }
    }

    /// Split the host, panicking on an invalid host.
    pub fn split(&mut self, options: SplitOptions) -> SplitText {
        split(&mut self.doc, &self.layout, self.host, options).expect("split host")
    }

    pub fn texts(&self, nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|&n| self.doc.text_content(n)).collect()
    }

    pub fn by_id(&self, id: &str) -> NodeId {
        find_by_id(&self.doc, id).unwrap_or_else(|| panic!("no element with id {id}"))
    }

    /// `margin-left` of `node` in px, zero when unset.
    pub fn margin(&self, node: NodeId) -> f32 {
        self.doc
            .style_property(node, "margin-left")
            .and_then(|v| parse_length(&v, 16.0))
            .unwrap_or(0.0)
    }

    /// Host descendants carrying `class`.
    pub fn with_class(&self, class: &str) -> Vec<NodeId> {
        self.doc
            .descendants(self.host)
            .into_iter()
            .filter(|&n| self.doc.attr(n, "class") == Some(class))
            .collect()
    }
}

pub fn find_by_id(doc: &Document, id: &str) -> Option<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .find(|&n| doc.attr(n, "id") == Some(id))
}
