//! Text splitting.
//!
//! The pipeline, in order:
//!
//! 1. [`collect`]: graphemes and words with inline ancestor chains
//! 2. render: char/word containers, inline wrappers rebuilt around them
//! 3. kerning: pairwise width deltas applied as `margin-left`
//! 4. lines: units grouped by vertical position into line containers
//!
//! [`split`] runs it in place and returns a [`SplitText`] session that keeps
//! the output in sync with resizes and typography changes.
//! [`split_to_tree`] runs it and returns the output as data instead.

mod collect;
mod kerning;
mod lines;
pub(crate) mod measure;
mod options;
mod render;
mod scheduler;
mod session;
mod tree;

pub use collect::{
    AncestorArena, AncestorId, AncestorInfo, Collected, MeasuredChar, MeasuredWord, collect,
};
pub use kerning::MAX_OFFSET;
pub use lines::line_tolerance;
pub use measure::MeasureStrategy;
pub use options::{
    DEFAULT_BREAK_CHARS, Granularity, ResplitCallback, SplitCallback, SplitOptions, SplitType,
};
pub use render::SR_ONLY_CLASS;
pub use scheduler::{COUPLING_EPSILON, SessionState, WIDTH_EPSILON};
pub use session::{
    Completion, CompletionState, SplitResult, SplitText, split, split_to_tree,
};
pub use tree::{SplitTree, TreeNode, line_fingerprint};
