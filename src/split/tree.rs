//! Serializable split output.

use crate::dom::{Attribute, Document, NodeId, NodeData};
use crate::unicode::normalize_line_text;
use serde::{Deserialize, Serialize};

/// One node of a split tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Element {
        tag: String,
        attrs: Vec<Attribute>,
        children: Vec<TreeNode>,
    },
    Text {
        text: String,
    },
}

impl TreeNode {
    /// Snapshot the subtree rooted at `node`.
    #[must_use]
    pub fn from_document(doc: &Document, node: NodeId) -> Option<Self> {
        match &doc.get(node)?.data {
            NodeData::Text(text) => Some(Self::Text { text: text.clone() }),
            NodeData::Element(el) => Some(Self::Element {
                tag: el.tag.clone(),
                attrs: el.attrs.clone(),
                children: doc
                    .children(node)
                    .iter()
                    .filter_map(|&c| Self::from_document(doc, c))
                    .collect(),
            }),
        }
    }

    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Element { children, .. } => children.iter().map(Self::text_content).collect(),
        }
    }

    /// Rebuild this node as a detached subtree of `doc`.
    pub fn instantiate(&self, doc: &mut Document) -> NodeId {
        match self {
            Self::Text { text } => doc.create_text(text),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                let el = doc.create_element(tag);
                for attr in attrs {
                    doc.set_attr(el, &attr.name, &attr.value);
                }
                for child in children {
                    let node = child.instantiate(doc);
                    doc.append_child(el, node);
                }
                el
            }
        }
    }
}

/// Data-only split result: the generated content plus unit texts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTree {
    /// Generated children of the host, in order.
    pub nodes: Vec<TreeNode>,
    pub chars: Vec<String>,
    pub words: Vec<String>,
    pub lines: Vec<String>,
}

impl SplitTree {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Line fingerprint of this tree.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        line_fingerprint(&self.lines)
    }
}

/// NFC-normalized, whitespace-collapsed line texts joined by newlines.
#[must_use]
pub fn line_fingerprint<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|l| normalize_line_text(l.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_normalizes() {
        let a = line_fingerprint(&["cafe\u{301}  au", " lait"]);
        let b = line_fingerprint(&["caf\u{e9} au", "lait"]);
        assert_eq!(a, b);
        assert_eq!(a, "caf\u{e9} au\nlait");
    }

    #[test]
    fn test_tree_from_document_and_back() {
        let mut doc = Document::from_html("<p class=\"x\">Hi <b>there</b></p>");
        let p = doc.children(doc.root())[0];
        let node = TreeNode::from_document(&doc, p).unwrap();
        assert_eq!(node.text_content(), "Hi there");

        let copy = node.instantiate(&mut doc);
        assert_eq!(doc.outer_html(copy), doc.outer_html(p));
    }

    #[test]
    fn test_json_shape() {
        let tree = SplitTree {
            nodes: vec![TreeNode::Text {
                text: "a".to_string(),
            }],
            chars: vec!["a".to_string()],
            words: vec!["a".to_string()],
            lines: vec!["a".to_string()],
        };
        let json = tree.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"nodes":[{"type":"text","text":"a"}],"chars":["a"],"words":["a"],"lines":["a"]}"#
        );
        assert_eq!(SplitTree::from_json(&json).unwrap(), tree);
    }
}
