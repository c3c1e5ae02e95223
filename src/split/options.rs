//! Split configuration.

use super::session::{Completion, SplitResult};
use crate::event::warn;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Requested output granularities.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SplitType: u8 {
        const CHARS = 0b001;
        const WORDS = 0b010;
        const LINES = 0b100;
    }
}

impl Default for SplitType {
    fn default() -> Self {
        Self::all()
    }
}

impl SplitType {
    /// Parse a comma or space separated list such as `"chars,words"`.
    ///
    /// Unknown names or an empty list fall back to all granularities with a
    /// warning.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self::try_parse(input).unwrap_or_else(|| {
            warn(&format!(
                "unsupported split type {input:?}, falling back to chars,words,lines"
            ));
            Self::all()
        })
    }

    /// Strict variant of [`SplitType::parse`].
    #[must_use]
    pub fn try_parse(input: &str) -> Option<Self> {
        let mut parsed = Self::empty();
        for part in input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
        {
            parsed |= match part.to_ascii_lowercase().as_str() {
                "chars" | "char" => Self::CHARS,
                "words" | "word" => Self::WORDS,
                "lines" | "line" => Self::LINES,
                _ => return None,
            };
        }
        (!parsed.is_empty()).then_some(parsed)
    }

    /// Only lines, without char or word containers.
    #[must_use]
    pub fn is_lines_only(self) -> bool {
        self == Self::LINES
    }
}

impl<'de> Deserialize<'de> for SplitType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A single output granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Chars,
    Words,
    Lines,
}

impl Granularity {
    #[must_use]
    pub fn flag(self) -> SplitType {
        match self {
            Self::Chars => SplitType::CHARS,
            Self::Words => SplitType::WORDS,
            Self::Lines => SplitType::LINES,
        }
    }

    /// Index attribute and custom property stem (`char`, `word`, `line`).
    #[must_use]
    pub fn stem(self) -> &'static str {
        match self {
            Self::Chars => "char",
            Self::Words => "word",
            Self::Lines => "line",
        }
    }
}

/// Called once after the first split. May return a [`Completion`] that
/// `revert_on_complete` waits on.
pub type SplitCallback = Rc<dyn Fn(&SplitResult) -> Option<Completion>>;

/// Called after every full rebuild with the replacement collections.
pub type ResplitCallback = Rc<dyn Fn(&SplitResult)>;

/// Options for [`split`](super::split) and [`split_to_tree`](super::split_to_tree).
///
/// Data fields deserialize from camelCase JSON (`{"type": "words,lines",
/// "autoSplit": true}`); callbacks are attached with the builder methods.
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitOptions {
    #[serde(rename = "type")]
    pub split_type: SplitType,
    pub char_class: String,
    pub word_class: String,
    pub line_class: String,
    pub mask: Option<Granularity>,
    pub auto_split: bool,
    pub resplit_debounce_ms: u64,
    pub disable_kerning: bool,
    pub prop_index: bool,
    pub revert_on_complete: bool,
    pub break_chars: Vec<char>,
    #[serde(skip)]
    pub on_split: Option<SplitCallback>,
    #[serde(skip)]
    pub on_resplit: Option<ResplitCallback>,
}

/// Em dash, en dash, hyphen, slash, figure dash, horizontal bar.
pub const DEFAULT_BREAK_CHARS: &[char] = &['\u{2014}', '\u{2013}', '-', '/', '\u{2012}', '\u{2015}'];

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            split_type: SplitType::all(),
            char_class: "split-char".to_string(),
            word_class: "split-word".to_string(),
            line_class: "split-line".to_string(),
            mask: None,
            auto_split: false,
            resplit_debounce_ms: 100,
            disable_kerning: false,
            prop_index: false,
            revert_on_complete: false,
            break_chars: DEFAULT_BREAK_CHARS.to_vec(),
            on_split: None,
            on_resplit: None,
        }
    }
}

impl fmt::Debug for SplitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitOptions")
            .field("split_type", &self.split_type)
            .field("char_class", &self.char_class)
            .field("word_class", &self.word_class)
            .field("line_class", &self.line_class)
            .field("mask", &self.mask)
            .field("auto_split", &self.auto_split)
            .field("resplit_debounce_ms", &self.resplit_debounce_ms)
            .field("disable_kerning", &self.disable_kerning)
            .field("prop_index", &self.prop_index)
            .field("revert_on_complete", &self.revert_on_complete)
            .field("break_chars", &self.break_chars)
            .field("on_split", &self.on_split.is_some())
            .field("on_resplit", &self.on_resplit.is_some())
            .finish()
    }
}

impl SplitOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON object.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_type(mut self, split_type: SplitType) -> Self {
        self.split_type = split_type;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: Granularity) -> Self {
        self.mask = Some(mask);
        self
    }

    #[must_use]
    pub fn with_auto_split(mut self, enabled: bool) -> Self {
        self.auto_split = enabled;
        self
    }

    #[must_use]
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.resplit_debounce_ms = ms;
        self
    }

    #[must_use]
    pub fn with_kerning(mut self, enabled: bool) -> Self {
        self.disable_kerning = !enabled;
        self
    }

    #[must_use]
    pub fn with_prop_index(mut self, enabled: bool) -> Self {
        self.prop_index = enabled;
        self
    }

    #[must_use]
    pub fn with_revert_on_complete(mut self, enabled: bool) -> Self {
        self.revert_on_complete = enabled;
        self
    }

    #[must_use]
    pub fn with_break_chars(mut self, chars: &[char]) -> Self {
        self.break_chars = chars.to_vec();
        self
    }

    #[must_use]
    pub fn with_on_split<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SplitResult) -> Option<Completion> + 'static,
    {
        self.on_split = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn with_on_resplit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SplitResult) + 'static,
    {
        self.on_resplit = Some(Rc::new(callback));
        self
    }

    pub(crate) fn has(&self, granularity: Granularity) -> bool {
        self.split_type.contains(granularity.flag())
    }

    pub(crate) fn masks(&self, granularity: Granularity) -> bool {
        self.mask == Some(granularity) && self.has(granularity)
    }

    pub(crate) fn class_for(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Chars => &self.char_class,
            Granularity::Words => &self.word_class,
            Granularity::Lines => &self.line_class,
        }
    }

    /// Replace an empty split type with the full default.
    pub(crate) fn normalized(mut self) -> Self {
        if self.split_type.is_empty() {
            warn("empty split type, falling back to chars,words,lines");
            self.split_type = SplitType::all();
        }
        self
    }
}
