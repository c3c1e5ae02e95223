//! Arena-backed document tree.
//!
//! The splitter never owns platform nodes. It works against this explicit
//! tree: a slot vector of [`Node`]s addressed by [`NodeId`], with a free list
//! for slot reuse.
//!
//! # Invariants
//!
//! - The root element (`body`) always exists and is never freed
//! - A node appears in at most one parent's child list
//! - Every mutation bumps [`Document::revision`], so layout caches can key on it
//!
//! # Examples
//!
//! ```
//! use kernsplit::dom::Document;
//!
//! let mut doc = Document::new();
//! let p = doc.create_element("p");
//! let root = doc.root();
//! doc.append_child(root, p);
//! let text = doc.create_text("Hello");
//! doc.append_child(p, text);
//! assert_eq!(doc.text_content(p), "Hello");
//! assert_eq!(doc.outer_html(p), "<p>Hello</p>");
//! ```

mod parse;
mod style;
pub mod tags;

pub use style::{ComputedStyle, Display, TYPOGRAPHY_PROPERTIES, format_px, parse_length};

use crate::split::measure::MeasureState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a node in a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Build a handle from its raw slot index.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw slot index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single element attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<Attribute>,
}

/// Node payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

/// A node slot.
#[derive(Clone, Debug)]
pub struct Node {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Document tree.
#[derive(Debug)]
pub struct Document {
    id: u64,
    nodes: Vec<Option<Node>>,
    free_list: Vec<u32>,
    root: NodeId,
    revision: u64,
    pub(crate) measure: MeasureState,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `body` root.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: NodeId(0),
            revision: 0,
            measure: MeasureState::default(),
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// Create a document and parse `html` into its root.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.append_html(root, html);
        doc
    }

    /// Process-unique identity of this document.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Mutation counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.touch();
        if let Some(raw) = self.free_list.pop() {
            self.nodes[raw as usize] = Some(node);
            return NodeId(raw);
        }
        self.nodes.push(Some(node));
        NodeId((self.nodes.len() - 1) as u32)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })))
    }

    /// Create a detached element with attributes.
    pub fn create_element_with(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attr(id, name, value);
        }
        id
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.to_string())))
    }

    /// Parse `html` and append the resulting nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let nodes = parse::parse_fragment(self, html);
        for &node in &nodes {
            self.append_child(parent, node);
        }
        nodes
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(NodeData::Element(_)))
    }

    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(NodeData::Text(_)))
    }

    /// Lowercase tag name of an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element(el) => Some(el.tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(text) => Some(text.as_str()),
            NodeData::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let Some(Node {
            data: NodeData::Text(text),
            ..
        }) = self.get_mut(id)
        {
            value.clone_into(text);
            self.touch();
        }
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Ordered children (empty for text or unknown nodes).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Element attributes (empty for text or unknown nodes).
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element(el)) => &el.attrs,
            _ => &[],
        }
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(Node {
            data: NodeData::Element(el),
            ..
        }) = self.get_mut(id)
        else {
            return;
        };
        if let Some(attr) = el.attrs.iter_mut().find(|a| a.name == name) {
            value.clone_into(&mut attr.value);
        } else {
            el.attrs.push(Attribute::new(name, value));
        }
        self.touch();
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(Node {
            data: NodeData::Element(el),
            ..
        }) = self.get_mut(id)
        {
            el.attrs.retain(|a| a.name != name);
            self.touch();
        }
    }

    /// Detach `id` from its parent. The node stays allocated.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
        self.touch();
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` before `reference` (or at the end when `None`).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        if self.is_inclusive_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        let Some(p) = self.get_mut(parent) else {
            return;
        };
        let pos = reference
            .and_then(|r| p.children.iter().position(|&c| c == r))
            .unwrap_or(p.children.len());
        p.children.insert(pos, child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        self.touch();
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Detach and release `id` and all its descendants.
    pub fn free_subtree(&mut self, id: NodeId) {
        if id == self.root || !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes[current.index()].take() {
                stack.extend(node.children);
                self.free_list.push(current.0);
            }
        }
        self.touch();
    }

    /// Detach all children of `parent` and return them (still allocated).
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = self.children(parent).to_vec();
        for &child in &children {
            self.detach(child);
        }
        children
    }

    /// Release all children of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        for child in self.take_children(parent) {
            self.free_subtree(child);
        }
    }

    /// Deep-clone `id` into a new detached subtree.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.get(id)?.data.clone();
        let children = self.children(id).to_vec();
        let copy = self.alloc(Node::new(data));
        for child in children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    /// Whether `id` is reachable from the root.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.root, id)
    }

    /// Descendants of `id` in document order (excluding `id`).
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Text content with `br` read as a space and whitespace collapsed.
    #[must_use]
    pub fn plain_text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        for node in self.descendants(id) {
            match self.get(node).map(|n| &n.data) {
                Some(NodeData::Text(text)) => raw.push_str(text),
                Some(NodeData::Element(el)) if el.tag == "br" => raw.push(' '),
                _ => {}
            }
        }
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Merge adjacent text siblings below `id` and drop empty text nodes.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            if let Some(text) = self.text(child).map(str::to_string) {
                if text.is_empty() {
                    self.free_subtree(child);
                    continue;
                }
                if let Some(prev) = previous_text {
                    let merged = format!("{}{text}", self.text(prev).unwrap_or_default());
                    self.set_text(prev, &merged);
                    self.free_subtree(child);
                    continue;
                }
                previous_text = Some(child);
            } else {
                previous_text = None;
                self.normalize(child);
            }
        }
    }

    /// Serialize `id` including its own tag.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serialize the children of `id`.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for attr in &el.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape(&attr.value, true));
                    out.push('"');
                }
                out.push('>');
                if tags::is_void(&el.tag) {
                    return;
                }
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    /// Read one inline style declaration.
    #[must_use]
    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        style::parse_declarations(style)
            .into_iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value)
    }

    /// Set one inline style declaration, keeping declaration order.
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        if !self.is_element(id) {
            return;
        }
        let mut decls = self
            .attr(id, "style")
            .map(style::parse_declarations)
            .unwrap_or_default();
        if let Some(decl) = decls.iter_mut().find(|(prop, _)| prop == name) {
            value.clone_into(&mut decl.1);
        } else {
            decls.push((name.to_string(), value.to_string()));
        }
        self.set_attr(id, "style", &style::serialize_declarations(&decls));
    }

    /// Remove one inline style declaration; drops the attribute when empty.
    pub fn remove_style_property(&mut self, id: NodeId, name: &str) {
        let Some(style) = self.attr(id, "style") else {
            return;
        };
        let mut decls = style::parse_declarations(style);
        let before = decls.len();
        decls.retain(|(prop, _)| prop != name);
        if decls.len() == before {
            return;
        }
        if decls.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", &style::serialize_declarations(&decls));
        }
    }

    /// Resolve inherited typography for `id` (text nodes use their parent).
    #[must_use]
    pub fn computed_style(&self, id: NodeId) -> ComputedStyle {
        ComputedStyle::resolve(self, id)
    }

    /// Effective `display` of an element.
    #[must_use]
    pub fn display(&self, id: NodeId) -> Display {
        style::display_of(self, id)
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}
