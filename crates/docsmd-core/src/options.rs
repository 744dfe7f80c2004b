//! Configuration options for Markdown serialization

use std::fmt;

use crate::ast::Block;

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Use indented code blocks (4 spaces)
    Indented,
    /// Use fenced code blocks (```)
    #[default]
    Fenced,
}

/// How list item content is indented after the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListItemIndent {
    /// Marker followed by a single space (`- item`, `1. item`)
    #[default]
    One,
    /// Marker padded to the next tab stop (`-   item`)
    Tab,
}

/// A join rule decides how many blank lines separate two adjacent blocks.
///
/// Rules are consulted in order; the first one returning `Some` wins. When
/// every rule returns `None` the serializer uses its default spacing.
pub type Join = fn(&Block, &Block) -> Option<usize>;

/// Options for Markdown serialization
#[derive(Clone)]
pub struct Options {
    /// Bullet list marker
    pub bullet: char,

    /// Emphasis delimiter
    pub emphasis: char,

    /// Strong delimiter (doubled when rendered)
    pub strong: char,

    /// Delimiter placed around underlined text
    pub underline: String,

    /// Code block style
    pub code_block_style: CodeBlockStyle,

    /// Fence string for fenced code blocks
    pub fence: String,

    /// Thematic break string
    pub rule: String,

    /// List item indentation
    pub list_item_indent: ListItemIndent,

    /// Custom join rules for adjacent blocks
    pub join: Vec<Join>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bullet: '*',
            emphasis: '*',
            strong: '*',
            underline: "_".to_string(),
            code_block_style: CodeBlockStyle::Fenced,
            fence: "```".to_string(),
            rule: "***".to_string(),
            list_item_indent: ListItemIndent::One,
            join: Vec::new(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("bullet", &self.bullet)
            .field("emphasis", &self.emphasis)
            .field("strong", &self.strong)
            .field("underline", &self.underline)
            .field("code_block_style", &self.code_block_style)
            .field("fence", &self.fence)
            .field("rule", &self.rule)
            .field("list_item_indent", &self.list_item_indent)
            .field("join", &self.join.len())
            .finish()
    }
}
