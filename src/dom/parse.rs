//! HTML fragment parsing through html5ever.
//!
//! The tree builder drives a [`TreeSink`] that writes straight into the
//! [`Document`] arena. Fragments are parsed in a `body` context; the scratch
//! document and `html` nodes the builder creates are released afterwards,
//! leaving the fragment's top-level nodes detached. Comments, processing
//! instructions and doctypes are dropped.

use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as HtmlAttribute, ParseOpts, QualName, local_name, namespace_url, ns};

use super::{Document, NodeId};

/// Parse `html` into detached top-level nodes.
pub(super) fn parse_fragment(doc: &mut Document, html: &str) -> Vec<NodeId> {
    let sink = FragmentSink::new(doc);
    let context = QualName::new(None, ns!(html), local_name!("body"));
    html5ever::parse_fragment(sink, ParseOpts::default(), context, Vec::new()).one(html)
}

fn attr_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local),
        None => name.local.to_string(),
    }
}

struct FragmentSink<'doc> {
    doc: RefCell<&'doc mut Document>,
    /// Stand-in for the document node the tree builder appends `html` to.
    document: NodeId,
    names: RefCell<HashMap<NodeId, QualName>>,
    /// Comment and processing-instruction handles; never attached.
    discarded: RefCell<Vec<NodeId>>,
    unknown: RefCell<QualName>,
}

impl<'doc> FragmentSink<'doc> {
    fn new(doc: &'doc mut Document) -> Self {
        let document = doc.create_element("#document");
        Self {
            doc: RefCell::new(doc),
            document,
            names: RefCell::new(HashMap::new()),
            discarded: RefCell::new(Vec::new()),
            unknown: RefCell::new(QualName::new(None, ns!(html), local_name!("span"))),
        }
    }

    #[track_caller]
    fn doc(&self) -> RefMut<'_, &'doc mut Document> {
        self.doc.borrow_mut()
    }

    fn is_discarded(&self, id: NodeId) -> bool {
        self.discarded.borrow().contains(&id)
    }

    fn placeholder(&self) -> NodeId {
        let id = self.doc().create_element("#comment");
        self.discarded.borrow_mut().push(id);
        id
    }

    /// Extend `candidate` when it is a text node, else report `false`.
    fn merge_text(&self, candidate: Option<NodeId>, text: &str) -> bool {
        let mut doc = self.doc();
        let Some(existing) = candidate.and_then(|id| doc.text(id)).map(str::to_owned) else {
            return false;
        };
        if let Some(id) = candidate {
            doc.set_text(id, &format!("{existing}{text}"));
        }
        true
    }
}

impl TreeSink for FragmentSink<'_> {
    type Handle = NodeId;
    type Output = Vec<NodeId>;
    type ElemName<'a>
        = Ref<'a, QualName>
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let doc = self.doc.into_inner();
        let mut top = Vec::new();
        for wrapper in doc.take_children(self.document) {
            top.extend(doc.take_children(wrapper));
            doc.free_subtree(wrapper);
        }
        doc.free_subtree(self.document);
        // The context element and nodes the builder removed stay orphaned.
        let orphans = self
            .names
            .into_inner()
            .into_keys()
            .chain(self.discarded.into_inner())
            .filter(|&id| doc.contains(id) && doc.parent(id).is_none() && !top.contains(&id));
        for id in orphans.collect::<Vec<_>>() {
            doc.free_subtree(id);
        }
        top
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::filter_map(self.names.borrow(), |names| names.get(target))
            .unwrap_or_else(|_| self.unknown.borrow())
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<HtmlAttribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let id = {
            let mut doc = self.doc();
            let id = doc.create_element(&name.local);
            for attr in &attrs {
                doc.set_attr(id, &attr_name(&attr.name), &attr.value);
            }
            id
        };
        self.names.borrow_mut().insert(id, name);
        id
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.placeholder()
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.placeholder()
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(id) => {
                if !self.is_discarded(id) {
                    self.doc().append_child(*parent, id);
                }
            }
            NodeOrText::AppendText(text) => {
                let last = self.doc().children(*parent).last().copied();
                if !self.merge_text(last, &text) {
                    let mut doc = self.doc();
                    let node = doc.create_text(&text);
                    doc.append_child(*parent, node);
                }
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(parent) = self.doc().parent(*sibling) else {
            return;
        };
        match new_node {
            NodeOrText::AppendNode(id) => {
                if !self.is_discarded(id) {
                    self.doc().insert_before(parent, id, Some(*sibling));
                }
            }
            NodeOrText::AppendText(text) => {
                let previous = {
                    let doc = self.doc();
                    let siblings = doc.children(parent);
                    siblings
                        .iter()
                        .position(|c| c == sibling)
                        .and_then(|i| i.checked_sub(1))
                        .map(|i| siblings[i])
                };
                if !self.merge_text(previous, &text) {
                    let mut doc = self.doc();
                    let node = doc.create_text(&text);
                    doc.insert_before(parent, node, Some(*sibling));
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.doc().parent(*element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<HtmlAttribute>) {
        let mut doc = self.doc();
        for attr in &attrs {
            let name = attr_name(&attr.name);
            if doc.attr(*target, &name).is_none() {
                doc.set_attr(*target, &name, &attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.doc().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut doc = self.doc();
        for child in doc.take_children(*node) {
            doc.append_child(*new_parent, child);
        }
    }
}
