//! Markdown Abstract Syntax Tree
//!
//! This module defines the AST nodes for representing Markdown documents.
//! Conversion handlers produce [`Fragment`]s, which are later grouped into
//! blocks and handed to the serializer.

/// A block-level Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Root document container
    Document(Vec<Block>),

    /// Heading with level (1-6) and inline content
    Heading { level: u8, content: Vec<Inline> },

    /// Paragraph containing inline content
    Paragraph(Vec<Inline>),

    /// Block quote containing nested blocks
    BlockQuote(Vec<Block>),

    /// List (ordered or unordered)
    List {
        ordered: bool,
        start: u32,
        items: Vec<ListItem>,
    },

    /// Code block; fenced or indented according to the serializer options
    CodeBlock {
        language: Option<String>,
        code: String,
    },

    /// Thematic break (horizontal rule)
    ThematicBreak,

    /// GFM table with a header row and body rows
    Table {
        headers: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },

    /// Raw HTML block, written verbatim
    HtmlBlock(String),
}

/// A list item containing blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Block>,
}

impl ListItem {
    pub fn new(content: Vec<Block>) -> Self {
        Self { content }
    }

    pub fn from_inlines(inlines: Vec<Inline>) -> Self {
        Self {
            content: vec![Block::Paragraph(inlines)],
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|b| b.is_blank())
    }
}

/// An inline Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Plain text, already escaped for Markdown
    Text(String),

    /// Strong emphasis (bold)
    Strong(Vec<Inline>),

    /// Emphasis (italic)
    Emphasis(Vec<Inline>),

    /// Underlined text, rendered with the configured underline delimiter
    Underline(Vec<Inline>),

    /// GFM strikethrough
    Strikethrough(Vec<Inline>),

    /// Inline code
    Code(String),

    /// Link with text, URL, and optional title
    Link {
        content: Vec<Inline>,
        url: String,
        title: Option<String>,
    },

    /// Image with alt text, URL, and optional title
    Image {
        alt: String,
        url: String,
        title: Option<String>,
    },

    /// Hard line break
    LineBreak,

    /// Raw HTML inline, written verbatim
    HtmlInline(String),
}

/// What a conversion handler returns: either a block or a piece of
/// phrasing content. Runs of inline fragments at block level are later
/// wrapped into paragraphs.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Block(Block),
    Inline(Inline),
}

impl From<Block> for Fragment {
    fn from(block: Block) -> Self {
        Fragment::Block(block)
    }
}

impl From<Inline> for Fragment {
    fn from(inline: Inline) -> Self {
        Fragment::Inline(inline)
    }
}

impl Block {
    /// Check if this block is empty/blank
    pub fn is_blank(&self) -> bool {
        match self {
            Block::Document(blocks) => blocks.iter().all(|b| b.is_blank()),
            Block::Paragraph(inlines) => inlines.iter().all(|i| i.is_blank()),
            Block::Heading { content, .. } => content.iter().all(|i| i.is_blank()),
            Block::BlockQuote(blocks) => blocks.iter().all(|b| b.is_blank()),
            Block::List { items, .. } => items.iter().all(|i| i.is_blank()),
            Block::CodeBlock { code, .. } => code.trim().is_empty(),
            Block::Table { headers, rows } => {
                headers.iter().all(|h| h.iter().all(|i| i.is_blank()))
                    && rows
                        .iter()
                        .all(|r| r.iter().all(|c| c.iter().all(|i| i.is_blank())))
            }
            Block::ThematicBreak => false,
            Block::HtmlBlock(html) => html.trim().is_empty(),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    /// Flatten a block into phrasing content, for blocks that end up in an
    /// inline context (a heading inside a table cell, say).
    pub fn into_inlines(self) -> Vec<Inline> {
        match self {
            Block::Paragraph(inlines) | Block::Heading { content: inlines, .. } => inlines,
            Block::Document(blocks) | Block::BlockQuote(blocks) => join_block_inlines(blocks),
            Block::List { items, .. } => {
                join_block_inlines(items.into_iter().flat_map(|i| i.content).collect())
            }
            Block::CodeBlock { code, .. } => vec![Inline::Code(code)],
            Block::Table { headers, rows } => {
                let mut inlines = Vec::new();
                for cell in headers.into_iter().chain(rows.into_iter().flatten()) {
                    if !inlines.is_empty() {
                        inlines.push(Inline::Text(" ".to_string()));
                    }
                    inlines.extend(cell);
                }
                inlines
            }
            Block::ThematicBreak => Vec::new(),
            Block::HtmlBlock(html) => vec![Inline::HtmlInline(html)],
        }
    }
}

fn join_block_inlines(blocks: Vec<Block>) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for block in blocks {
        let part = block.into_inlines();
        if part.is_empty() {
            continue;
        }
        if !inlines.is_empty() {
            inlines.push(Inline::LineBreak);
        }
        inlines.extend(part);
    }
    inlines
}

impl Inline {
    /// Check if this inline is empty/blank
    pub fn is_blank(&self) -> bool {
        match self {
            Inline::Text(text) => text.trim().is_empty(),
            Inline::Strong(inlines)
            | Inline::Emphasis(inlines)
            | Inline::Underline(inlines)
            | Inline::Strikethrough(inlines) => inlines.iter().all(|i| i.is_blank()),
            Inline::Code(code) => code.is_empty(),
            Inline::Link { content, .. } => content.iter().all(|i| i.is_blank()),
            Inline::Image { .. } => false,
            Inline::LineBreak => false,
            Inline::HtmlInline(html) => html.trim().is_empty(),
        }
    }

    /// Children of a formatting wrapper, if this is one
    pub fn children_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Inline::Strong(inlines)
            | Inline::Emphasis(inlines)
            | Inline::Underline(inlines)
            | Inline::Strikethrough(inlines)
            | Inline::Link {
                content: inlines, ..
            } => Some(inlines),
            _ => None,
        }
    }
}
