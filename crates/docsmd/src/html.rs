//! HTML parsing support.
//!
//! This module parses HTML strings with `scraper` and copies the result into
//! the owned [`Node`] tree used by the rest of the pipeline.

use log::debug;
use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a Node tree.
///
/// Parsing is lenient: malformed markup is recovered the way a browser
/// would, and the parser's diagnostics are only logged. The returned node
/// is a document fragment holding the top-level nodes of the input.
///
/// # Example
///
/// ```rust
/// use docsmd::parse_html;
///
/// let root = parse_html("<p>Hello <em>World</em></p>");
/// assert_eq!(root.children[0].tag_name(), "p");
/// assert_eq!(root.text_content(), "Hello World");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    if !document.errors.is_empty() {
        debug!("HTML parser recovered from {} errors", document.errors.len());
    }

    let mut root = Node::document_fragment();
    root.children = scraper_children(document.root_element());
    root
}

/// Serialize a Node tree's contents back to HTML.
pub fn to_html(root: &Node) -> String {
    root.inner_html()
}

/// Convert a scraper ElementRef to our Node structure
fn scraper_to_node(element: ElementRef) -> Node {
    let tag = element.value().name();

    // Collect attributes
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();

    let mut node = if attrs.is_empty() {
        Node::element(tag)
    } else {
        Node::element_with_attrs(tag, attrs)
    };
    node.children = scraper_children(element);
    node
}

fn scraper_children(element: ElementRef) -> Vec<Node> {
    let mut children = Vec::new();
    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => children.push(Node::text(&text.text)),
            ScraperNode::Comment(comment) => children.push(Node::comment(&comment.comment)),
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    children.push(scraper_to_node(child_element));
                }
            }
            _ => {}
        }
    }
    children
}
