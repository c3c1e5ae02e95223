//! Grapheme and word collection.
//!
//! Walks the host's content in document order and produces
//! [`MeasuredWord`]s: grapheme clusters grouped into words, each grapheme
//! tagged with the chain of inline formatting elements it sits in.
//!
//! Word boundaries:
//!
//! - whitespace closes the current word; a space is rendered before the next
//! - a break character (dash, slash, ...) is kept at the end of the current
//!   word, and the next word is marked `no_space_before`
//! - a `br`, or moving into a different block ancestor, closes the word and
//!   marks the next word `hard_break_before`
//!
//! Ancestors are interned once per source element into an
//! [`AncestorArena`], so downstream "same enclosing element" checks are
//! integer comparisons.

use crate::dom::{Attribute, Display, Document, NodeId, tags};
use crate::unicode::{graphemes, is_break_grapheme, is_contextual, is_whitespace_grapheme};
use std::collections::HashMap;
use std::rc::Rc;

/// Dense identity of one source inline formatting element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AncestorId(u32);

impl AncestorId {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Copied description of an inline formatting element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestorInfo {
    pub id: AncestorId,
    pub tag: String,
    pub attrs: Vec<Attribute>,
}

/// Interned ancestors for one collection pass.
#[derive(Clone, Debug, Default)]
pub struct AncestorArena {
    infos: Vec<AncestorInfo>,
    by_node: HashMap<NodeId, AncestorId>,
}

impl AncestorArena {
    fn intern(&mut self, doc: &Document, node: NodeId) -> AncestorId {
        if let Some(&id) = self.by_node.get(&node) {
            return id;
        }
        let id = AncestorId(self.infos.len() as u32);
        self.infos.push(AncestorInfo {
            id,
            tag: doc.tag(node).unwrap_or("span").to_string(),
            attrs: doc.attrs(node).to_vec(),
        });
        self.by_node.insert(node, id);
        id
    }

    #[must_use]
    pub fn get(&self, id: AncestorId) -> Option<&AncestorInfo> {
        self.infos.get(id.0 as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// One grapheme cluster and its inline ancestor chain (outermost first).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasuredChar {
    pub grapheme: String,
    pub ancestors: Rc<[AncestorId]>,
}

impl MeasuredChar {
    /// Whether the grapheme belongs to a script that shapes contextually.
    #[must_use]
    pub fn is_contextual(&self) -> bool {
        is_contextual(&self.grapheme)
    }
}

/// A word: graphemes plus the boundary flags before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeasuredWord {
    pub chars: Vec<MeasuredChar>,
    pub no_space_before: bool,
    pub hard_break_before: bool,
}

impl MeasuredWord {
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.grapheme.as_str()).collect()
    }

    /// Ancestor chain shared by every grapheme of the word.
    #[must_use]
    pub fn outer_chain(&self) -> &[AncestorId] {
        let Some(first) = self.chars.first() else {
            return &[];
        };
        let len = self
            .chars
            .iter()
            .map(|c| common_prefix_len(&first.ancestors, &c.ancestors))
            .min()
            .unwrap_or(0);
        &first.ancestors[..len]
    }

    /// Whether a literal space separates this word from the previous one.
    #[must_use]
    pub fn has_space_before(&self) -> bool {
        !self.no_space_before && !self.hard_break_before
    }
}

/// Output of [`collect`].
#[derive(Clone, Debug, Default)]
pub struct Collected {
    pub words: Vec<MeasuredWord>,
    pub ancestors: AncestorArena,
    /// False when the content has no inline formatting at all; chains are
    /// then empty.
    pub track_ancestors: bool,
}

pub(crate) fn common_prefix_len(a: &[AncestorId], b: &[AncestorId]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Collect the words of `host`'s content.
#[must_use]
pub fn collect(doc: &Document, host: NodeId, break_chars: &[char]) -> Collected {
    let track_ancestors = doc
        .descendants(host)
        .into_iter()
        .any(|n| doc.tag(n).is_some_and(tags::is_inline_formatting));

    let mut walker = Walker {
        doc,
        host,
        break_chars,
        track_ancestors,
        arena: AncestorArena::default(),
        chains: HashMap::new(),
        words: Vec::new(),
        current: Vec::new(),
        no_space_next: false,
        hard_break_next: false,
        last_block: None,
        empty_chain: Rc::from(Vec::new()),
    };
    walker.visit_children(host);
    walker.close_word();

    Collected {
        words: walker.words,
        ancestors: walker.arena,
        track_ancestors,
    }
}

struct Walker<'a> {
    doc: &'a Document,
    host: NodeId,
    break_chars: &'a [char],
    track_ancestors: bool,
    arena: AncestorArena,
    chains: HashMap<NodeId, Rc<[AncestorId]>>,
    words: Vec<MeasuredWord>,
    current: Vec<MeasuredChar>,
    no_space_next: bool,
    hard_break_next: bool,
    last_block: Option<NodeId>,
    empty_chain: Rc<[AncestorId]>,
}

impl Walker<'_> {
    fn visit_children(&mut self, node: NodeId) {
        for &child in self.doc.children(node) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: NodeId) {
        if let Some(text) = self.doc.text(node) {
            self.visit_text(node, text);
            return;
        }
        let Some(tag) = self.doc.tag(node) else {
            return;
        };
        if tag == "br" {
            self.hard_break();
            return;
        }
        if tags::is_non_text(tag) || self.doc.display(node) == Display::None {
            return;
        }
        self.visit_children(node);
    }

    fn visit_text(&mut self, node: NodeId, text: &str) {
        let Some(parent) = self.doc.parent(node) else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let block = self.block_ancestor(parent);
        if self.last_block.is_some_and(|b| b != block) {
            self.hard_break();
        }
        self.last_block = Some(block);

        let chain = self.chain_for(parent);
        for g in graphemes(text) {
            if is_whitespace_grapheme(g) {
                self.close_word();
                self.no_space_next = false;
                continue;
            }
            self.current.push(MeasuredChar {
                grapheme: g.to_string(),
                ancestors: Rc::clone(&chain),
            });
            if is_break_grapheme(g, self.break_chars) {
                self.close_word();
                self.no_space_next = true;
            }
        }
    }

    fn hard_break(&mut self) {
        self.close_word();
        if !self.words.is_empty() {
            self.hard_break_next = true;
        }
    }

    fn close_word(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.words.push(MeasuredWord {
            chars: std::mem::take(&mut self.current),
            no_space_before: std::mem::take(&mut self.no_space_next),
            hard_break_before: std::mem::take(&mut self.hard_break_next),
        });
    }

    /// Nearest block-level ancestor, bounded by the host.
    fn block_ancestor(&self, parent: NodeId) -> NodeId {
        let mut current = parent;
        loop {
            if current == self.host || self.doc.display(current).is_block() {
                return current;
            }
            match self.doc.parent(current) {
                Some(next) => current = next,
                None => return self.host,
            }
        }
    }

    fn chain_for(&mut self, parent: NodeId) -> Rc<[AncestorId]> {
        if !self.track_ancestors {
            return Rc::clone(&self.empty_chain);
        }
        if let Some(chain) = self.chains.get(&parent) {
            return Rc::clone(chain);
        }

        let mut elements = Vec::new();
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == self.host {
                break;
            }
            if self.doc.tag(node).is_some_and(tags::is_inline_formatting) {
                elements.push(node);
            }
            current = self.doc.parent(node);
        }
        let chain: Rc<[AncestorId]> = elements
            .iter()
            .rev()
            .map(|&n| self.arena.intern(self.doc, n))
            .collect();
        self.chains.insert(parent, Rc::clone(&chain));
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::options::DEFAULT_BREAK_CHARS;

    fn words_of(html: &str) -> Collected {
        let doc = Document::from_html(html);
        let host = doc.children(doc.root())[0];
        collect(&doc, host, DEFAULT_BREAK_CHARS)
    }

    fn texts(collected: &Collected) -> Vec<String> {
        collected.words.iter().map(MeasuredWord::text).collect()
    }

    #[test]
    fn test_whitespace_splits_words() {
        let c = words_of("<p>  Hello   big world </p>");
        assert_eq!(texts(&c), vec!["Hello", "big", "world"]);
        assert!(c.words.iter().all(MeasuredWord::has_space_before));
        assert!(!c.track_ancestors);
    }

    #[test]
    fn test_dash_continuation() {
        let c = words_of("<p>word\u{2014}continuation</p>");
        assert_eq!(texts(&c), vec!["word\u{2014}", "continuation"]);
        assert!(c.words[1].no_space_before);
    }

    #[test]
    fn test_dash_then_space_keeps_space() {
        let c = words_of("<p>well- known</p>");
        assert_eq!(texts(&c), vec!["well-", "known"]);
        assert!(!c.words[1].no_space_before);
    }

    #[test]
    fn test_br_marks_hard_break() {
        let c = words_of("<p><br>one<br>two</p>");
        assert_eq!(texts(&c), vec!["one", "two"]);
        assert!(!c.words[0].hard_break_before);
        assert!(c.words[1].hard_break_before);
    }

    #[test]
    fn test_block_change_is_hard_break() {
        let c = words_of("<div><p>one</p><p>two</p></div>");
        assert_eq!(texts(&c), vec!["one", "two"]);
        assert!(c.words[1].hard_break_before);
    }

    #[test]
    fn test_grapheme_clusters_stay_whole() {
        let c = words_of("<p>e\u{301}\u{1F44D}\u{1F3FD}</p>");
        let graphemes: Vec<&str> = c.words[0]
            .chars
            .iter()
            .map(|ch| ch.grapheme.as_str())
            .collect();
        assert_eq!(graphemes, vec!["e\u{301}", "\u{1F44D}\u{1F3FD}"]);
    }

    #[test]
    fn test_ancestor_chains_share_identity() {
        let c = words_of("<p>a <a href=\"/x\">b <em>c</em></a> d</p>");
        assert!(c.track_ancestors);
        assert_eq!(c.ancestors.len(), 2);

        let b = &c.words[1];
        let cw = &c.words[2];
        assert_eq!(b.outer_chain().len(), 1);
        assert_eq!(cw.outer_chain().len(), 2);
        assert_eq!(b.outer_chain()[0], cw.outer_chain()[0]);
        assert!(c.words[3].outer_chain().is_empty());

        let anchor = c.ancestors.get(b.outer_chain()[0]).unwrap();
        assert_eq!(anchor.tag, "a");
        assert_eq!(anchor.attrs[0].value, "/x");
    }

    #[test]
    fn test_outer_chain_is_common_prefix() {
        let c = words_of("<p>ab<b>cd</b></p>");
        assert_eq!(c.words.len(), 1);
        assert!(c.words[0].outer_chain().is_empty());
        assert_eq!(c.words[0].chars[3].ancestors.len(), 1);
    }

    #[test]
    fn test_empty_and_non_text_content() {
        assert!(words_of("<p>   </p>").words.is_empty());
        let c = words_of("<div><script>var x;</script>hi</div>");
        assert_eq!(texts(&c), vec!["hi"]);
    }

    #[test]
    fn test_contextual_flag() {
        let c = words_of("<p>\u{0645}\u{0631}\u{062D}\u{0628}\u{0627}</p>");
        assert!(c.words[0].chars.iter().all(MeasuredChar::is_contextual));
    }
}
