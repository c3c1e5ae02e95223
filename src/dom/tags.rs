//! Tag classification tables.

/// Inline formatting elements whose wrappers are rebuilt around split units.
pub const INLINE_FORMATTING_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "del", "dfn", "em", "font", "i", "ins",
    "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Elements that establish a block by default.
pub const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "html",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Elements whose role accepts an `aria-label`.
pub const LABELABLE_TAGS: &[&str] = &[
    "a",
    "article",
    "button",
    "figcaption",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "label",
    "legend",
    "li",
    "nav",
    "section",
    "summary",
    "td",
    "th",
];

/// Elements that never contribute text.
pub const NON_TEXT_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Elements without children.
pub const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr", "meta", "link"];

#[must_use]
pub fn is_inline_formatting(tag: &str) -> bool {
    INLINE_FORMATTING_TAGS.contains(&tag)
}

#[must_use]
pub fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

#[must_use]
pub fn is_labelable(tag: &str) -> bool {
    LABELABLE_TAGS.contains(&tag)
}

#[must_use]
pub fn is_non_text(tag: &str) -> bool {
    NON_TEXT_TAGS.contains(&tag)
}

#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}
