//! Line detection by vertical position.

use super::render::RenderedWord;
use crate::dom::{Document, NodeId};
use crate::event::warn;
use crate::layout::LayoutEngine;

/// Minimum line-change tolerance in logical pixels.
const MIN_TOLERANCE: f32 = 5.0;

/// Tolerance as a fraction of the host font size.
const TOLERANCE_RATIO: f32 = 0.3;

/// Vertical jitter allowed within one line for `font_size`.
#[must_use]
pub fn line_tolerance(font_size: f32) -> f32 {
    MIN_TOLERANCE.max(TOLERANCE_RATIO * font_size)
}

/// Group word indices into lines.
///
/// Hard breaks split the sequence into segments first; inside a segment a
/// new line starts whenever a unit's top differs from the first top of the
/// current line by more than [`line_tolerance`]. Tops must be read after
/// kerning offsets are applied.
pub(crate) fn detect_lines(
    doc: &Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
    words: &[RenderedWord],
) -> Vec<Vec<usize>> {
    let segments = hard_break_segments(words);
    let tops: Option<Vec<f32>> = words
        .iter()
        .map(|w| layout.rect(doc, w.unit).map(|r| r.y))
        .collect();
    let Some(tops) = tops else {
        warn("line detection skipped: layout is unavailable, grouping by hard breaks only");
        return segments;
    };

    let tolerance = line_tolerance(layout.font_size(doc, host));
    let mut lines = Vec::new();
    for segment in segments {
        let mut current: Vec<usize> = Vec::new();
        let mut reference = 0.0_f32;
        for wi in segment {
            let top = tops[wi];
            if current.is_empty() {
                reference = top;
            } else if (top - reference).abs() > tolerance {
                lines.push(std::mem::take(&mut current));
                reference = top;
            }
            current.push(wi);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn hard_break_segments(words: &[RenderedWord]) -> Vec<Vec<usize>> {
    let mut segments: Vec<Vec<usize>> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        match segments.last_mut() {
            Some(segment) if !word.hard_break_before => segment.push(i),
            _ => segments.push(vec![i]),
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FlowLayout;
    use crate::split::collect::collect;
    use crate::split::options::{SplitOptions, SplitType};
    use crate::split::render::render;

    fn groups(html: &str, width: f32) -> Vec<Vec<usize>> {
        let options = SplitOptions::new().with_type(SplitType::WORDS);
        let mut doc = Document::from_html(html);
        let host = doc.children(doc.root())[0];
        doc.set_style_property(host, "width", &format!("{width}px"));
        let collected = collect(&doc, host, &options.break_chars);
        doc.clear_children(host);
        let rendered = render(&mut doc, host, &collected, &options);
        let layout = FlowLayout::simple(1000.0);
        detect_lines(&doc, &layout, host, &rendered.words)
    }

    #[test]
    fn test_tolerance_floor() {
        assert_eq!(line_tolerance(10.0), 5.0);
        assert!((line_tolerance(40.0) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_line() {
        assert_eq!(groups("<p>one two three</p>", 500.0), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_wrapping_produces_lines() {
        assert_eq!(
            groups("<p>aaaa bbbb cccc</p>", 40.0),
            vec![vec![0], vec![1], vec![2]]
        );
    }

    #[test]
    fn test_hard_break_forces_line() {
        assert_eq!(groups("<p>one<br>two</p>", 500.0), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_missing_layout_falls_back_to_segments() {
        let options = SplitOptions::new().with_type(SplitType::WORDS);
        let mut doc = Document::from_html("<p>a b<br>c</p>");
        let host = doc.children(doc.root())[0];
        let collected = collect(&doc, host, &options.break_chars);
        doc.clear_children(host);
        let rendered = render(&mut doc, host, &collected, &options);
        doc.detach(host);
        let layout = FlowLayout::simple(500.0);
        assert_eq!(
            detect_lines(&doc, &layout, host, &rendered.words),
            vec![vec![0, 1], vec![2]]
        );
    }
}
