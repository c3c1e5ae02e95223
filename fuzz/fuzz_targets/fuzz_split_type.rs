//! Fuzz target for split option parsing.
//!
//! Arbitrary type strings and JSON documents must never panic, and a parsed
//! split type is never empty.

#![no_main]

use kernsplit::{SplitOptions, SplitType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    assert!(!SplitType::parse(data).is_empty());
    if let Some(parsed) = SplitType::try_parse(data) {
        assert!(!parsed.is_empty());
    }

    if let Ok(options) = SplitOptions::from_json(data) {
        assert!(!options.split_type.is_empty());
    }
});
