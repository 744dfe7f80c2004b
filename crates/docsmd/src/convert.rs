//! Convert the HTML Node tree to the Markdown AST.
//!
//! Conversion is driven by a [`State`] that walks the tree and dispatches
//! each element to its [`Handler`](crate::Handler). Handlers return
//! [`Fragment`]s; inline runs at block level are wrapped into paragraphs.

use std::collections::HashMap;

use docsmd_core::{Block, Fragment, Inline};
use log::debug;

use crate::handlers::{semantic_handlers, Handlers};
use crate::node::{Node, NodeType};
use crate::service::Options;
use crate::slug::Slugger;

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Conversion state for one document
pub struct State<'a> {
    /// Options for this conversion
    pub options: &'a Options,
    handlers: Handlers,
    element_by_id: HashMap<&'a str, &'a Node>,
    heading_slugs: HashMap<&'a str, String>,
}

impl<'a> State<'a> {
    /// Index `root` and prepare to convert it.
    ///
    /// Every heading is slugged here, in document order, so repeated heading
    /// texts get distinct slugs no matter how often they are linked to.
    pub fn new(root: &'a Node, options: &'a Options, handlers: Handlers) -> Self {
        let mut element_by_id = HashMap::new();
        let mut heading_slugs = HashMap::new();
        let mut slugger = Slugger::new();

        root.walk(&mut |node| {
            if !node.is_element() {
                return;
            }
            let id = node.attr("id").filter(|id| !id.is_empty());
            if let Some(id) = id {
                element_by_id.entry(id).or_insert(node);
            }
            if HEADINGS.contains(&node.tag_name()) {
                let slug = slugger.slug(&node.text_content());
                if let Some(id) = id {
                    heading_slugs.entry(id).or_insert(slug);
                }
            }
        });

        debug!(
            "Indexed {} ids, {} linkable headings",
            element_by_id.len(),
            heading_slugs.len()
        );

        Self {
            options,
            handlers,
            element_by_id,
            heading_slugs,
        }
    }

    /// Look up an element by its `id` attribute (first one wins)
    pub fn element_by_id(&self, id: &str) -> Option<&'a Node> {
        self.element_by_id.get(id).copied()
    }

    /// Slug of the heading with the given id
    pub fn heading_slug(&self, id: &str) -> Option<&str> {
        self.heading_slugs.get(id).map(|s| s.as_str())
    }

    /// Convert all children of a node
    pub fn all(&mut self, node: &'a Node) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        for child in node.children() {
            fragments.extend(self.one(child));
        }
        fragments
    }

    /// Convert a single node
    pub fn one(&mut self, node: &'a Node) -> Vec<Fragment> {
        match node.node_type {
            NodeType::Text => {
                let text = collapse_whitespace(node.node_value.as_deref().unwrap_or(""));
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::Text(escape_markdown(&text)).into()]
                }
            }
            NodeType::Element => match self.handlers.get(node.tag_name()) {
                Some(handler) => handler(self, node),
                None => self.all(node),
            },
            NodeType::Document | NodeType::DocumentFragment => self.all(node),
            NodeType::Comment => Vec::new(),
        }
    }

    /// Convert the children of a node into phrasing content.
    ///
    /// Blocks among the children are flattened and set off with hard breaks.
    pub fn inlines(&mut self, node: &'a Node) -> Vec<Inline> {
        let fragments = self.all(node);
        normalize_inlines(fragments_to_inlines(fragments))
    }

    /// Convert the children of a node into blocks
    pub fn blocks(&mut self, node: &'a Node) -> Vec<Block> {
        let fragments = self.all(node);
        wrap_fragments(fragments)
    }
}

/// Convert a cleaned HTML tree into a Markdown document
pub fn to_markdown_ast(root: &Node, options: &Options) -> Block {
    let mut state = State::new(root, options, semantic_handlers());
    let fragments = state.one(root);
    Block::Document(wrap_fragments(fragments))
}

/// Group fragments into blocks: each run of inline fragments becomes a
/// trimmed paragraph, blank runs are dropped.
pub fn wrap_fragments(fragments: Vec<Fragment>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();

    for fragment in fragments {
        match fragment {
            Fragment::Inline(inline) => run.push(inline),
            Fragment::Block(block) => {
                flush_paragraph(&mut blocks, &mut run);
                blocks.push(block);
            }
        }
    }
    flush_paragraph(&mut blocks, &mut run);

    blocks
}

fn flush_paragraph(blocks: &mut Vec<Block>, run: &mut Vec<Inline>) {
    if run.is_empty() {
        return;
    }
    let inlines = trim_inlines(normalize_inlines(std::mem::take(run)));
    if !inlines.iter().all(|i| i.is_blank()) {
        blocks.push(Block::Paragraph(inlines));
    }
}

fn fragments_to_inlines(fragments: Vec<Fragment>) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut after_block = false;

    for fragment in fragments {
        match fragment {
            Fragment::Inline(inline) => {
                if after_block && !inline.is_blank() {
                    inlines.push(Inline::LineBreak);
                    after_block = false;
                }
                inlines.push(inline);
            }
            Fragment::Block(block) => {
                let part = trim_inlines(block.into_inlines());
                if part.is_empty() {
                    continue;
                }
                if inlines.iter().any(|i: &Inline| !i.is_blank()) {
                    inlines.push(Inline::LineBreak);
                }
                inlines.extend(part);
                after_block = true;
            }
        }
    }

    inlines
}

/// Merge adjacent text and collapse spaces that meet across node
/// boundaries.
fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());

    for inline in inlines {
        if let Inline::Text(text) = &inline {
            if let Some(Inline::Text(previous)) = out.last_mut() {
                if previous.ends_with(' ') && text.starts_with(' ') {
                    previous.push_str(&text[1..]);
                } else {
                    previous.push_str(text);
                }
                continue;
            }
        }
        out.push(inline);
    }

    out
}

/// Strip whitespace at the edges of phrasing content and around hard
/// breaks, looking into formatting wrappers at the edges.
pub fn trim_inlines(mut inlines: Vec<Inline>) -> Vec<Inline> {
    trim_start(&mut inlines);
    trim_end(&mut inlines);

    // Whitespace next to a hard break
    for i in 0..inlines.len() {
        if inlines[i] != Inline::LineBreak {
            continue;
        }
        if let Some(Inline::Text(text)) = i.checked_sub(1).and_then(|p| inlines.get_mut(p)) {
            let end = text.trim_end_matches(' ').len();
            text.truncate(end);
        }
        if let Some(Inline::Text(text)) = inlines.get_mut(i + 1) {
            *text = text.trim_start_matches(' ').to_string();
        }
    }

    inlines.retain(|i| !matches!(i, Inline::Text(t) if t.is_empty()));
    inlines
}

fn trim_start(inlines: &mut Vec<Inline>) {
    while let Some(first) = inlines.first_mut() {
        match first {
            Inline::Text(text) => {
                *text = text.trim_start_matches(' ').to_string();
                if text.is_empty() {
                    inlines.remove(0);
                    continue;
                }
            }
            other => {
                if let Some(children) = other.children_mut() {
                    trim_start(children);
                }
            }
        }
        break;
    }
}

fn trim_end(inlines: &mut Vec<Inline>) {
    while let Some(last) = inlines.last_mut() {
        match last {
            Inline::Text(text) => {
                let end = text.trim_end_matches(' ').len();
                text.truncate(end);
                if text.is_empty() {
                    inlines.pop();
                    continue;
                }
            }
            other => {
                if let Some(children) = other.children_mut() {
                    trim_end(children);
                }
            }
        }
        break;
    }
}

/// Collapse runs of ASCII whitespace into single spaces
pub(crate) fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_whitespace = false;

    for c in s.chars() {
        if c.is_ascii_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result
}

/// Escape Markdown special characters in text
pub(crate) fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' | '*' | '_' | '`' | '[' | '<' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}
