//! Error types for kernsplit.

use crate::dom::NodeId;
use std::fmt;

/// Result type alias for kernsplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for kernsplit operations.
///
/// Only input-type violations are fatal. Degenerate input, missing
/// prerequisites and measurement failures are reported through
/// [`crate::event::emit_log`] and never surface here.
#[derive(Debug)]
pub enum Error {
    /// The split target is a text node, not an element.
    NotAnElement(NodeId),
    /// The node id does not refer to a live node in the document.
    UnknownNode(NodeId),
    /// Serializing a split tree failed.
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnElement(id) => write!(f, "split target {id} is not an element"),
            Self::UnknownNode(id) => write!(f, "node {id} does not exist in the document"),
            Self::Serialization(msg) => write!(f, "split tree serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
