//! Unicode utilities for grapheme segmentation, script detection and
//! normalization.

mod grapheme;
mod normalize;
mod script;
mod width;

pub use grapheme::{graphemes, is_break_grapheme, is_whitespace_grapheme};
pub use normalize::{collapse_whitespace, normalize_nfc, normalize_line_text};
pub use script::{is_contextual, is_contextual_script};
pub use width::{display_width, is_wide};
