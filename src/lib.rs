//! `kernsplit` - kerning-preserving text splitting
//!
//! Splits the text of an element into character, word, and line containers
//! for animation, while keeping the spacing and line breaks the unsplit
//! text had. Pair kerning lost by separating glyphs is measured and
//! restored as per-character offsets, and a session keeps the split in sync
//! as the container resizes or its typography changes.
//!
//! The crate works against an explicit [`dom::Document`] tree and reads
//! geometry through the [`layout::LayoutEngine`] trait.
//! [`layout::FlowLayout`] is a deterministic engine for headless use.

// Crate-level lint configuration
#![forbid(unsafe_code)]
#![allow(clippy::cast_possible_truncation)] // Dense u32 node ids
#![allow(clippy::cast_precision_loss)] // Pixel math in f32
#![allow(clippy::module_name_repetitions)] // Allow split::SplitOptions etc
#![allow(clippy::struct_excessive_bools)] // Options carry several flags
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::float_cmp)] // Exact comparisons are intentional for fract checks
#![allow(clippy::suboptimal_flops)] // Standard math notation is clearer than mul_add
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference

pub mod dom;
pub mod error;
pub mod event;
pub mod layout;
pub mod split;
pub mod unicode;

// Re-export core types at crate root
pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use event::{LogLevel, clear_log_callback, emit_log, set_log_callback};
pub use layout::{FlowLayout, LayoutEngine, Rect, SimpleMetrics};
pub use split::{
    Completion, Granularity, SessionState, SplitOptions, SplitResult, SplitText, SplitTree,
    SplitType, split, split_to_tree,
};
