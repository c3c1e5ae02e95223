//! Resplit scheduling state.
//!
//! The scheduler owns no timers. Callers report resize observations,
//! advance time through [`SplitText::poll`](super::SplitText::poll) and
//! deliver paint callbacks through
//! [`SplitText::on_frame`](super::SplitText::on_frame); the scheduler only
//! records what is pending.

use crate::dom::{Display, Document, NodeId};
use crate::layout::LayoutEngine;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum width change (logical px) that counts as a resize.
pub const WIDTH_EPSILON: f32 = 0.5;

/// Parent widths within this distance of the host width are considered to
/// track the host rather than constrain it.
pub const COUPLING_EPSILON: f32 = 1.0;

/// Lifecycle of a splitting session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Output is present and nothing is pending.
    Split,
    /// A debounced rebuild or frame work is pending.
    PendingRefresh,
    /// Terminal. Observers and pending work are gone.
    Disposed,
}

/// Work deferred to the next paint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameWork {
    KerningRefresh,
    LineRebuild,
}

#[derive(Debug)]
pub(crate) struct Scheduler {
    targets: Vec<NodeId>,
    last_widths: HashMap<NodeId, f32>,
    deadline: Option<Instant>,
    frame: Option<FrameWork>,
    pub(crate) style_key: String,
    disposed: bool,
}

impl Scheduler {
    pub(crate) fn new(targets: Vec<NodeId>, style_key: String) -> Self {
        Self {
            targets,
            last_widths: HashMap::new(),
            deadline: None,
            frame: None,
            style_key,
            disposed: false,
        }
    }

    pub(crate) fn disposed() -> Self {
        let mut scheduler = Self::new(Vec::new(), String::new());
        scheduler.disposed = true;
        scheduler
    }

    pub(crate) fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub(crate) fn is_observing(&self) -> bool {
        !self.disposed && !self.targets.is_empty()
    }

    /// Record an observed width. Returns true when it should trigger a
    /// rebuild: the target is observed, was seen before, and moved by more
    /// than [`WIDTH_EPSILON`].
    pub(crate) fn record_width(&mut self, target: NodeId, width: f32) -> bool {
        if !self.is_observing() || !self.targets.contains(&target) {
            return false;
        }
        match self.last_widths.insert(target, width) {
            None => false,
            Some(previous) => {
                if (width - previous).abs() > WIDTH_EPSILON {
                    true
                } else {
                    // Sub-epsilon drift keeps the old reference.
                    self.last_widths.insert(target, previous);
                    false
                }
            }
        }
    }

    /// Restart the debounce timer.
    pub(crate) fn arm(&mut self, now: Instant, delay: Duration) {
        if !self.disposed {
            self.deadline = Some(now + delay);
        }
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the timer if it has expired.
    pub(crate) fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel a pending debounced rebuild.
    pub(crate) fn cancel_timer(&mut self) {
        self.deadline = None;
    }

    /// Queue work for the next paint. A line rebuild supersedes a kerning
    /// refresh.
    pub(crate) fn request_frame(&mut self, work: FrameWork) {
        if self.disposed {
            return;
        }
        self.frame = match (self.frame, work) {
            (Some(FrameWork::LineRebuild), _) | (_, FrameWork::LineRebuild) => {
                Some(FrameWork::LineRebuild)
            }
            _ => Some(FrameWork::KerningRefresh),
        };
    }

    pub(crate) fn frame(&self) -> Option<FrameWork> {
        self.frame
    }

    pub(crate) fn take_frame(&mut self) -> Option<FrameWork> {
        self.frame.take()
    }

    pub(crate) fn state(&self) -> SessionState {
        if self.disposed {
            SessionState::Disposed
        } else if self.deadline.is_some() || self.frame.is_some() {
            SessionState::PendingRefresh
        } else {
            SessionState::Split
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drop observers, widths, and pending work. Terminal.
    pub(crate) fn dispose(&mut self) {
        self.disposed = true;
        self.targets.clear();
        self.last_widths.clear();
        self.deadline = None;
        self.frame = None;
    }
}

/// Nearest ancestor that generates a box (skips `display: contents`).
fn effective_parent(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = doc.parent(node)?;
    while doc.display(current) == Display::Contents {
        current = doc.parent(current)?;
    }
    Some(current)
}

/// Resize observation targets for `host`: its effective parent, plus the
/// next ancestor up when the parent's width tracks the host's own width.
pub(crate) fn observation_targets(
    doc: &Document,
    layout: &dyn LayoutEngine,
    host: NodeId,
) -> Vec<NodeId> {
    let Some(parent) = effective_parent(doc, host) else {
        return Vec::new();
    };
    let mut targets = vec![parent];

    let host_width = layout.rect(doc, host).map(|r| r.width);
    let parent_width = layout.rect(doc, parent).map(|r| r.width);
    if let (Some(host_width), Some(parent_width)) = (host_width, parent_width) {
        if (host_width - parent_width).abs() < COUPLING_EPSILON {
            if let Some(ancestor) = effective_parent(doc, parent) {
                targets.push(ancestor);
            }
        }
    }
    targets
}
