//! Deterministic block/inline flow layout.
//!
//! A deliberately small engine: blocks stack vertically, inline content
//! wraps greedily, `inline-block` elements are atomic boxes, and glyph
//! kerning only applies between neighbours in the same text node. That last
//! rule is exactly what makes naive per-character splitting lose spacing, so
//! the engine reproduces the problem the splitter compensates for.
//!
//! # Supported
//!
//! - `display`: block, inline, inline-block, contents, none
//! - `position: absolute | fixed` (out of flow, unconstrained width unless
//!   `width` is set, placed at `left`/`top`)
//! - `width` on blocks, `margin-left` on inline boxes
//! - soft wraps at collapsible whitespace, after dash glyphs, and between
//!   adjacent atomic boxes; `br` forces a break
//! - `letter-spacing`, `word-spacing`, `text-transform`, `font-kerning: none`
//! - `white-space: pre | pre-wrap | break-spaces` keeps spaces as glyphs

// Layout routines carry a lot of positional state
#![allow(clippy::too_many_arguments)]
#![allow(clippy::too_many_lines)]

use super::metrics::{FontKey, FontMetrics, SimpleMetrics};
use super::{LayoutEngine, Rect};
use crate::dom::{Display, Document, NodeId, parse_length};
use crate::unicode::{graphemes, is_whitespace_grapheme};
use std::cell::RefCell;
use std::collections::HashMap;

/// Line height as a multiple of font size.
const LINE_HEIGHT: f32 = 1.2;

/// Overflow slack before a chunk wraps.
const FIT_EPSILON: f32 = 0.01;

/// Graphemes after which a soft wrap is allowed.
const WRAP_AFTER: &[&str] = &["-", "\u{2010}", "\u{2012}", "\u{2013}", "\u{2014}", "\u{2015}", "/"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheKey {
    document: u64,
    revision: u64,
    viewport_bits: u32,
}

#[derive(Clone, Debug, Default)]
struct Output {
    rects: HashMap<NodeId, Rect>,
    text_widths: HashMap<NodeId, f32>,
}

impl Output {
    fn extend_rect(&mut self, node: NodeId, rect: Rect) {
        self.rects
            .entry(node)
            .and_modify(|r| *r = r.union(&rect))
            .or_insert(rect);
    }

    fn add_text_width(&mut self, node: NodeId, width: f32) {
        *self.text_widths.entry(node).or_insert(0.0) += width;
    }

    fn absorb(&mut self, other: &Self, dx: f32, dy: f32) {
        for (&node, rect) in &other.rects {
            self.rects.insert(node, rect.translate(dx, dy));
        }
        for (&node, &width) in &other.text_widths {
            self.text_widths.insert(node, width);
        }
    }
}

#[derive(Clone, Debug)]
struct LayoutCache {
    key: CacheKey,
    output: Output,
}

#[derive(Clone, Debug)]
enum Item {
    Glyph {
        node: NodeId,
        width: f32,
        kern: f32,
        height: f32,
        wrap_after: bool,
    },
    Space {
        node: NodeId,
        width: f32,
        kern: f32,
        height: f32,
    },
    Open {
        node: NodeId,
        margin: f32,
    },
    Close,
    Break {
        node: Option<NodeId>,
        height: f32,
    },
    Atomic {
        node: NodeId,
        width: f32,
        height: f32,
        margin: f32,
        inner: Output,
    },
}

impl Item {
    fn advance(&self) -> f32 {
        match self {
            Self::Glyph { width, kern, .. } | Self::Space { width, kern, .. } => width + kern,
            Self::Open { margin, .. } => *margin,
            Self::Atomic { width, margin, .. } => width + margin,
            Self::Close | Self::Break { .. } => 0.0,
        }
    }

    fn height(&self) -> f32 {
        match self {
            Self::Glyph { height, .. }
            | Self::Space { height, .. }
            | Self::Break { height, .. }
            | Self::Atomic { height, .. } => *height,
            Self::Open { .. } | Self::Close => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChunkKind {
    Content,
    Space,
    Forced,
}

#[derive(Clone, Debug)]
struct Chunk {
    kind: ChunkKind,
    items: Vec<usize>,
}

/// Geometry produced for one inline formatting context.
struct Placed {
    height: f32,
    width: f32,
}

/// In-progress state of a block formatting context.
struct BlockCtx {
    x: f32,
    cursor_y: f32,
    width: f32,
    fallback_height: f32,
    max_line: f32,
    items: Vec<Item>,
}

/// Flow layout over a [`Document`].
///
/// # Examples
///
/// ```
/// use kernsplit::dom::Document;
/// use kernsplit::layout::{FlowLayout, LayoutEngine};
///
/// let doc = Document::from_html("<p>Hello world</p>");
/// let layout = FlowLayout::simple(800.0);
/// let p = doc.children(doc.root())[0];
/// let rect = layout.rect(&doc, p).unwrap();
/// assert_eq!(rect.width, 800.0);
/// assert!(rect.height > 0.0);
/// ```
pub struct FlowLayout<M: FontMetrics = SimpleMetrics> {
    metrics: M,
    viewport_width: f32,
    whole_pixel_ranges: bool,
    cache: RefCell<Option<LayoutCache>>,
}

impl FlowLayout<SimpleMetrics> {
    /// Layout with [`SimpleMetrics`].
    #[must_use]
    pub fn simple(viewport_width: f32) -> Self {
        Self::new(SimpleMetrics::new(), viewport_width)
    }
}

impl<M: FontMetrics> FlowLayout<M> {
    #[must_use]
    pub fn new(metrics: M, viewport_width: f32) -> Self {
        Self {
            metrics,
            viewport_width,
            whole_pixel_ranges: false,
            cache: RefCell::new(None),
        }
    }

    /// Round [`LayoutEngine::range_width`] to whole pixels.
    #[must_use]
    pub fn with_whole_pixel_ranges(mut self, enabled: bool) -> Self {
        self.whole_pixel_ranges = enabled;
        self
    }

    #[must_use]
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
        self.cache.replace(None);
    }

    fn query<R>(&self, doc: &Document, f: impl FnOnce(&Output) -> Option<R>) -> Option<R> {
        let key = CacheKey {
            document: doc.id(),
            revision: doc.revision(),
            viewport_bits: self.viewport_width.to_bits(),
        };
        let mut cache = self.cache.borrow_mut();
        if cache.as_ref().is_none_or(|c| c.key != key) {
            *cache = Some(LayoutCache {
                key,
                output: self.compute(doc),
            });
        }
        cache.as_ref().and_then(|c| f(&c.output))
    }

    fn compute(&self, doc: &Document) -> Output {
        let mut out = Output::default();
        let mut deferred = Vec::new();
        self.layout_block(
            doc,
            doc.root(),
            0.0,
            0.0,
            self.viewport_width,
            &mut out,
            &mut deferred,
        );

        while let Some(node) = deferred.pop() {
            let size = doc.computed_style(node).font_size;
            let length = |name: &str| {
                doc.style_property(node, name)
                    .and_then(|v| parse_length(&v, size))
            };
            let x = length("left").unwrap_or(0.0);
            let y = length("top").unwrap_or(0.0);
            self.layout_block(doc, node, x, y, f32::INFINITY, &mut out, &mut deferred);
        }
        out
    }

    fn layout_block(
        &self,
        doc: &Document,
        node: NodeId,
        x: f32,
        y: f32,
        available: f32,
        out: &mut Output,
        deferred: &mut Vec<NodeId>,
    ) -> Rect {
        let style = doc.computed_style(node);
        let width = doc
            .style_property(node, "width")
            .and_then(|v| parse_length(&v, style.font_size))
            .unwrap_or(available);

        let mut ctx = BlockCtx {
            x,
            cursor_y: y,
            width,
            fallback_height: style.font_size * LINE_HEIGHT,
            max_line: 0.0,
            items: Vec::new(),
        };
        self.flow_children(doc, node, &mut ctx, out, deferred);
        self.flush_inline(&mut ctx, out);

        let used_width = if width.is_finite() { width } else { ctx.max_line };
        let rect = Rect::new(x, y, used_width, ctx.cursor_y - y);
        out.rects.insert(node, rect);
        rect
    }

    fn flow_children(
        &self,
        doc: &Document,
        node: NodeId,
        ctx: &mut BlockCtx,
        out: &mut Output,
        deferred: &mut Vec<NodeId>,
    ) {
        for &child in doc.children(node) {
            if is_out_of_flow(doc, child) {
                deferred.push(child);
                continue;
            }
            match doc.display(child) {
                Display::None => {}
                Display::Contents => self.flow_children(doc, child, ctx, out, deferred),
                Display::Block => {
                    self.flush_inline(ctx, out);
                    let rect =
                        self.layout_block(doc, child, ctx.x, ctx.cursor_y, ctx.width, out, deferred);
                    ctx.cursor_y += rect.height;
                    ctx.max_line = ctx.max_line.max(rect.width);
                }
                Display::Inline | Display::InlineBlock => {
                    self.collect_inline(doc, child, &mut ctx.items, deferred);
                }
            }
        }
    }

    fn flush_inline(&self, ctx: &mut BlockCtx, out: &mut Output) {
        if ctx.items.is_empty() {
            return;
        }
        let items = std::mem::take(&mut ctx.items);
        let placed = place_lines(
            &items,
            ctx.x,
            ctx.cursor_y,
            ctx.width,
            ctx.fallback_height,
            out,
        );
        ctx.cursor_y += placed.height;
        ctx.max_line = ctx.max_line.max(placed.width);
    }

    fn collect_inline(
        &self,
        doc: &Document,
        node: NodeId,
        items: &mut Vec<Item>,
        deferred: &mut Vec<NodeId>,
    ) {
        if doc.is_text(node) {
            self.collect_text(doc, node, items);
            return;
        }
        if is_out_of_flow(doc, node) {
            deferred.push(node);
            return;
        }

        let style = doc.computed_style(node);
        let margin = doc
            .style_property(node, "margin-left")
            .and_then(|v| parse_length(&v, style.font_size))
            .unwrap_or(0.0);

        match doc.display(node) {
            Display::None => {}
            Display::Contents => {
                for &child in doc.children(node) {
                    self.collect_inline(doc, child, items, deferred);
                }
            }
            Display::Block => {
                let height = style.font_size * LINE_HEIGHT;
                items.push(Item::Break { node: None, height });
                for &child in doc.children(node) {
                    self.collect_inline(doc, child, items, deferred);
                }
                items.push(Item::Break { node: None, height });
            }
            Display::InlineBlock => {
                let mut inner_items = Vec::new();
                for &child in doc.children(node) {
                    self.collect_inline(doc, child, &mut inner_items, deferred);
                }
                let mut inner = Output::default();
                let line_height = style.font_size * LINE_HEIGHT;
                let placed = place_lines(
                    &inner_items,
                    0.0,
                    0.0,
                    f32::INFINITY,
                    line_height,
                    &mut inner,
                );
                items.push(Item::Atomic {
                    node,
                    width: placed.width,
                    height: placed.height.max(line_height),
                    margin,
                    inner,
                });
            }
            Display::Inline => {
                if doc.tag(node) == Some("br") {
                    items.push(Item::Break {
                        node: Some(node),
                        height: style.font_size * LINE_HEIGHT,
                    });
                    return;
                }
                items.push(Item::Open { node, margin });
                for &child in doc.children(node) {
                    self.collect_inline(doc, child, items, deferred);
                }
                items.push(Item::Close);
            }
        }
    }

    fn collect_text(&self, doc: &Document, node: NodeId, items: &mut Vec<Item>) {
        let Some(text) = doc.text(node) else {
            return;
        };
        let style = doc.computed_style(node);
        let font = FontKey::from_style(&style);
        let height = style.font_size * LINE_HEIGHT;
        let kerning = style.font_kerning != "none";
        let preserve = preserves_spaces(doc, node);
        let text = match style.text_transform.as_str() {
            "uppercase" => text.to_uppercase(),
            "lowercase" => text.to_lowercase(),
            _ => text.to_string(),
        };

        let mut previous: Option<&str> = None;
        for g in graphemes(&text) {
            let kern = match previous {
                Some(p) if kerning => self.metrics.kern(p, g, &font),
                _ => 0.0,
            };
            if is_whitespace_grapheme(g) && !preserve {
                let collapsible = items
                    .iter()
                    .rev()
                    .find(|item| !matches!(item, Item::Open { .. } | Item::Close))
                    .is_none_or(|item| matches!(item, Item::Space { .. } | Item::Break { .. }));
                if collapsible {
                    continue;
                }
                items.push(Item::Space {
                    node,
                    width: self.metrics.advance(" ", &font)
                        + style.letter_spacing
                        + style.word_spacing,
                    kern,
                    height,
                });
                previous = Some(" ");
            } else {
                items.push(Item::Glyph {
                    node,
                    width: self.metrics.advance(g, &font) + style.letter_spacing,
                    kern,
                    height,
                    wrap_after: WRAP_AFTER.contains(&g),
                });
                previous = Some(g);
            }
        }
    }
}

impl<M: FontMetrics> LayoutEngine for FlowLayout<M> {
    fn rect(&self, doc: &Document, node: NodeId) -> Option<Rect> {
        if !doc.is_connected(node) {
            return None;
        }
        self.query(doc, |out| out.rects.get(&node).copied())
    }

    fn range_width(&self, doc: &Document, text_node: NodeId) -> Option<f32> {
        if !doc.is_connected(text_node) || !doc.is_text(text_node) {
            return None;
        }
        let width = self
            .query(doc, |out| out.text_widths.get(&text_node).copied())
            .unwrap_or(0.0);
        Some(if self.whole_pixel_ranges {
            width.round()
        } else {
            width
        })
    }
}

/// Nearest `white-space` declaration on the ancestor chain keeps spaces.
fn preserves_spaces(doc: &Document, text_node: NodeId) -> bool {
    let mut current = doc.parent(text_node);
    while let Some(node) = current {
        if let Some(value) = doc.style_property(node, "white-space") {
            return matches!(value.as_str(), "pre" | "pre-wrap" | "break-spaces");
        }
        current = doc.parent(node);
    }
    false
}

fn is_out_of_flow(doc: &Document, node: NodeId) -> bool {
    doc.is_element(node)
        && doc
            .style_property(node, "position")
            .is_some_and(|p| p == "absolute" || p == "fixed")
}

/// Split items into unbreakable chunks at soft-wrap opportunities.
fn chunk_items(items: &[Item]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk {
        kind: ChunkKind::Content,
        items: Vec::new(),
    };
    let mut pending_opens: Vec<usize> = Vec::new();
    let mut wrap_ready = false;
    let mut last_atomic = false;

    let finish = |chunks: &mut Vec<Chunk>, current: &mut Chunk| {
        if !current.items.is_empty() {
            chunks.push(std::mem::replace(
                current,
                Chunk {
                    kind: ChunkKind::Content,
                    items: Vec::new(),
                },
            ));
        }
    };

    for (i, item) in items.iter().enumerate() {
        match item {
            Item::Open { .. } => pending_opens.push(i),
            Item::Close => {
                if pending_opens.is_empty() {
                    current.items.push(i);
                } else {
                    pending_opens.push(i);
                }
            }
            Item::Space { .. } | Item::Break { .. } => {
                finish(&mut chunks, &mut current);
                let kind = if matches!(item, Item::Space { .. }) {
                    ChunkKind::Space
                } else {
                    ChunkKind::Forced
                };
                let mut chunk_items = std::mem::take(&mut pending_opens);
                chunk_items.push(i);
                chunks.push(Chunk {
                    kind,
                    items: chunk_items,
                });
                wrap_ready = false;
                last_atomic = false;
            }
            Item::Glyph { wrap_after, .. } => {
                if wrap_ready {
                    finish(&mut chunks, &mut current);
                }
                current.items.append(&mut pending_opens);
                current.items.push(i);
                wrap_ready = *wrap_after;
                last_atomic = false;
            }
            Item::Atomic { .. } => {
                if wrap_ready || last_atomic {
                    finish(&mut chunks, &mut current);
                }
                current.items.append(&mut pending_opens);
                current.items.push(i);
                wrap_ready = false;
                last_atomic = true;
            }
        }
    }
    current.items.append(&mut pending_opens);
    finish(&mut chunks, &mut current);
    chunks
}

/// Greedy line placement. Records rects into `out` and returns the block
/// height and widest line.
fn place_lines(
    items: &[Item],
    x: f32,
    y: f32,
    available: f32,
    fallback_height: f32,
    out: &mut Output,
) -> Placed {
    let chunks = chunk_items(items);

    // Assign chunks to lines; dropped leading spaces are remembered.
    let mut lines: Vec<Vec<usize>> = vec![Vec::new()];
    let mut dropped = vec![false; chunks.len()];
    let mut content_width = 0.0_f32;
    let mut trailing_space = 0.0_f32;
    let mut has_content = false;

    for (ci, chunk) in chunks.iter().enumerate() {
        let width: f32 = chunk.items.iter().map(|&i| items[i].advance()).sum();
        match chunk.kind {
            ChunkKind::Forced => {
                if let Some(line) = lines.last_mut() {
                    line.push(ci);
                }
                lines.push(Vec::new());
                content_width = 0.0;
                trailing_space = 0.0;
                has_content = false;
            }
            ChunkKind::Space => {
                if !has_content {
                    dropped[ci] = true;
                }
                if let Some(line) = lines.last_mut() {
                    line.push(ci);
                }
                if has_content {
                    trailing_space += width;
                }
            }
            ChunkKind::Content => {
                if has_content && content_width + trailing_space + width > available + FIT_EPSILON
                {
                    lines.push(Vec::new());
                    content_width = 0.0;
                    trailing_space = 0.0;
                }
                if let Some(line) = lines.last_mut() {
                    line.push(ci);
                }
                content_width += trailing_space + width;
                trailing_space = 0.0;
                has_content = true;
            }
        }
    }
    if lines.len() > 1 && lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }

    let mut cursor_y = y;
    let mut widest = 0.0_f32;
    let mut open: Vec<NodeId> = Vec::new();

    for line in &lines {
        let line_height = line
            .iter()
            .flat_map(|&ci| chunks[ci].items.iter())
            .map(|&i| items[i].height())
            .fold(0.0_f32, f32::max);
        let line_height = if line_height > 0.0 {
            line_height
        } else {
            fallback_height
        };

        let mut cursor_x = x;
        for &ci in line {
            for &i in &chunks[ci].items {
                let item = &items[i];
                let visible = !dropped[ci];
                match item {
                    Item::Open { node, margin } => {
                        cursor_x += margin;
                        out.extend_rect(*node, Rect::new(cursor_x, cursor_y, 0.0, line_height));
                        open.push(*node);
                    }
                    Item::Close => {
                        open.pop();
                    }
                    Item::Glyph {
                        node, width, kern, ..
                    }
                    | Item::Space {
                        node, width, kern, ..
                    } => {
                        let (width, kern) = if visible { (*width, *kern) } else { (0.0, 0.0) };
                        let rect = Rect::new(cursor_x + kern, cursor_y, width, line_height);
                        out.extend_rect(*node, rect);
                        out.add_text_width(*node, width + kern);
                        for &el in &open {
                            out.extend_rect(el, rect);
                        }
                        cursor_x += width + kern;
                    }
                    Item::Atomic {
                        node,
                        width,
                        height,
                        margin,
                        inner,
                    } => {
                        let left = cursor_x + margin;
                        let rect = Rect::new(left, cursor_y, *width, *height);
                        out.absorb(inner, left, cursor_y);
                        out.rects.insert(*node, rect);
                        for &el in &open {
                            out.extend_rect(el, rect);
                        }
                        cursor_x = left + width;
                    }
                    Item::Break { node, .. } => {
                        if let Some(node) = node {
                            out.rects
                                .insert(*node, Rect::new(cursor_x, cursor_y, 0.0, line_height));
                        }
                    }
                }
            }
        }
        widest = widest.max(cursor_x - x);
        cursor_y += line_height;
    }

    Placed {
        height: cursor_y - y,
        width: widest,
    }
}
