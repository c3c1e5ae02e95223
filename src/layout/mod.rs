//! Layout measurement seam.
//!
//! The splitter never lays text out itself. Everything it needs from the
//! host's layout engine goes through [`LayoutEngine`]: box geometry, a fast
//! text-range width, and font size. [`FlowLayout`] is a deterministic
//! implementation over [`Document`](crate::dom::Document) for headless use
//! and tests.

mod flow;
mod metrics;

pub use flow::FlowLayout;
pub use metrics::{FontKey, FontMetrics, SimpleMetrics};

use crate::dom::{Document, NodeId};

/// Axis-aligned box in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rect covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Read-only access to the host's layout.
///
/// All reads are synchronous and reflect the document as it is at the time
/// of the call. Implementations return `None` for nodes that are not
/// connected or not rendered.
pub trait LayoutEngine {
    /// Border box of `node`.
    fn rect(&self, doc: &Document, node: NodeId) -> Option<Rect>;

    /// Width of a text node's content measured as a text range.
    ///
    /// Some engines return whole pixels here.
    fn range_width(&self, doc: &Document, text_node: NodeId) -> Option<f32>;

    /// Computed font size of `node` in logical pixels.
    fn font_size(&self, doc: &Document, node: NodeId) -> f32 {
        doc.computed_style(node).font_size
    }
}
