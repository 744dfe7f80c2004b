//! Normalize the HTML Google Docs puts on the clipboard.
//!
//! Google expresses almost all formatting as inline styles on `<span>`s,
//! wraps the whole selection in a `<b id="docs-internal-guid-…">`, routes
//! links through a redirect and writes nested lists as siblings. The
//! cleaner rewrites that markup into the plain semantic subset the
//! converter understands.

use log::{debug, trace};
use url::Url;

use crate::node::Node;
use crate::service::{Options, Suggestions};
use crate::transform::TreeTransform;

/// Elements that never carry document content.
const JUNK: &[&str] = &["meta", "style", "script", "title", "head", "link"];

/// Inline formatting elements the tidy-up steps operate on.
const FORMATTING: &[&str] = &["strong", "em", "u", "s", "del", "ins", "sup", "sub", "code"];

const MONOSPACE_FONTS: &[&str] = &[
    "courier new",
    "consolas",
    "roboto mono",
    "source code pro",
    "monospace",
];

/// Tree transform that cleans Google Docs HTML.
#[derive(Debug, Clone, Copy)]
pub struct CleanGoogleHtml<'a> {
    options: &'a Options,
}

impl<'a> CleanGoogleHtml<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }
}

impl TreeTransform for CleanGoogleHtml<'_> {
    fn transform(&self, tree: &mut Node) {
        remove_junk(tree);
        unwrap_document_wrapper(tree);
        convert_styled_spans(tree, false);
        merge_code_paragraphs(tree);
        fix_links(tree);
        fix_nested_lists(tree);
        apply_suggestions(tree, self.options.suggestions);
        unwrap_nested_formatting(tree, 0);
        merge_adjacent_formatting(tree);
        hoist_whitespace(tree);
        debug!("Cleaned Google Docs HTML");
    }
}

/// Rebuild `node`'s children from whatever `f` makes of each one.
fn replace_children(node: &mut Node, mut f: impl FnMut(Node) -> Vec<Node>) {
    let children = std::mem::take(&mut node.children);
    node.children = children.into_iter().flat_map(|child| f(child)).collect();
}

fn remove_junk(node: &mut Node) {
    node.children.retain(|child| !is_junk(child));
    for child in &mut node.children {
        remove_junk(child);
    }
}

fn is_junk(node: &Node) -> bool {
    node.is_comment()
        || JUNK.contains(&node.tag_name())
        || (node.is_tag("br") && has_class(node, "Apple-interchange-newline"))
}

fn has_class(node: &Node, class: &str) -> bool {
    node.attr("class")
        .map_or(false, |classes| classes.split_whitespace().any(|c| c == class))
}

fn unwrap_document_wrapper(node: &mut Node) {
    replace_children(node, |mut child| {
        unwrap_document_wrapper(&mut child);
        let is_wrapper = child.is_tag("b")
            && child
                .attr("id")
                .map_or(false, |id| id.starts_with("docs-internal-guid-"));
        if is_wrapper {
            child.children
        } else {
            vec![child]
        }
    });
}

/// Replace styled spans with the semantic elements their styles stand for.
fn convert_styled_spans(node: &mut Node, in_link: bool) {
    let in_link = in_link || node.is_tag("a");
    replace_children(node, |mut child| {
        convert_styled_spans(&mut child, in_link);
        if !child.is_tag("span") {
            return vec![child];
        }

        let tags = span_formatting(child.attr("style").unwrap_or(""), in_link);
        trace!("span styles -> {:?}", tags);
        let mut children = child.children;
        for tag in tags.iter().rev() {
            children = vec![Node::wrap(tag, children)];
        }
        children
    });
}

/// Formatting elements for a span's inline style, outermost first.
fn span_formatting(style: &str, in_link: bool) -> Vec<&'static str> {
    let mut bold = false;
    let mut italic = false;
    let mut underline = false;
    let mut strike = false;
    let mut vertical = None;
    let mut monospace = false;

    for (property, value) in declarations(style) {
        match property.as_str() {
            "font-weight" => bold = is_bold(&value),
            "font-style" => italic = value == "italic" || value == "oblique",
            "text-decoration" | "text-decoration-line" => {
                underline |= value.contains("underline");
                strike |= value.contains("line-through");
            }
            "vertical-align" => {
                vertical = match value.as_str() {
                    "super" => Some("sup"),
                    "sub" => Some("sub"),
                    _ => None,
                }
            }
            "font-family" => monospace = MONOSPACE_FONTS.iter().any(|f| value.contains(f)),
            _ => {}
        }
    }

    let mut tags = Vec::new();
    if bold {
        tags.push("strong");
    }
    if italic {
        tags.push("em");
    }
    // Links are underlined anyway
    if underline && !in_link {
        tags.push("u");
    }
    if strike {
        tags.push("s");
    }
    if let Some(tag) = vertical {
        tags.push(tag);
    }
    if monospace {
        tags.push("code");
    }
    tags
}

/// Lowercased `(property, value)` pairs of an inline style.
fn declarations(style: &str) -> impl Iterator<Item = (String, String)> + '_ {
    style.split(';').filter_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        Some((
            property.trim().to_ascii_lowercase(),
            value.trim().to_ascii_lowercase(),
        ))
    })
}

fn is_bold(weight: &str) -> bool {
    match weight {
        "bold" | "bolder" => true,
        other => other.parse::<u32>().map_or(false, |w| w >= 600),
    }
}

/// Merge runs of paragraphs made entirely of code into one code block.
fn merge_code_paragraphs(node: &mut Node) {
    for child in &mut node.children {
        merge_code_paragraphs(child);
    }

    let children = std::mem::take(&mut node.children);
    let mut lines: Vec<String> = Vec::new();
    for child in children {
        if is_code_paragraph(&child) {
            lines.push(code_line(&child));
            continue;
        }
        let is_blank_text = child.text_value().map_or(false, |t| t.trim().is_empty());
        if !lines.is_empty() && is_blank_text {
            continue;
        }
        flush_code_block(&mut node.children, &mut lines);
        node.children.push(child);
    }
    flush_code_block(&mut node.children, &mut lines);
}

fn flush_code_block(children: &mut Vec<Node>, lines: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let code = Node::wrap("code", vec![Node::text(&lines.join("\n"))]);
    children.push(Node::wrap("pre", vec![code]));
    lines.clear();
}

fn is_code_paragraph(node: &Node) -> bool {
    fn all_code(node: &Node, in_code: bool, found: &mut bool) -> bool {
        if let Some(text) = node.text_value() {
            if text.trim().is_empty() {
                return true;
            }
            *found |= in_code;
            return in_code;
        }
        let in_code = in_code || node.is_tag("code");
        node.children.iter().all(|child| all_code(child, in_code, found))
    }

    let mut found = false;
    node.is_tag("p") && all_code(node, false, &mut found) && found
}

fn code_line(paragraph: &Node) -> String {
    let mut line = String::new();
    paragraph.walk(&mut |node| {
        if let Some(text) = node.text_value() {
            line.push_str(&text.replace('\u{a0}', " "));
        } else if node.is_tag("br") {
            line.push('\n');
        }
    });
    line
}

fn fix_links(node: &mut Node) {
    if node.is_tag("a") {
        if let Some(href) = node.attr("href").map(fix_href) {
            node.set_attr("href", &href);
        }
    }
    for child in &mut node.children {
        fix_links(child);
    }
}

/// Resolve Google redirects and point in-document links at element ids.
fn fix_href(href: &str) -> String {
    let href = unwrap_redirect(href).unwrap_or_else(|| href.to_string());
    for marker in ["#heading=", "#bookmark="] {
        if let Some(index) = href.find(marker) {
            let base = &href[..index];
            if base.is_empty() || base.starts_with("https://docs.google.com/document/") {
                return format!("#{}", &href[index + marker.len()..]);
            }
        }
    }
    href
}

fn unwrap_redirect(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let is_redirect =
        matches!(url.host_str(), Some("www.google.com" | "google.com")) && url.path() == "/url";
    if !is_redirect {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, target)| target.into_owned())
}

fn is_list(node: &Node) -> bool {
    node.is_tag("ul") || node.is_tag("ol")
}

/// Move lists that sit directly in another list into the preceding item.
fn fix_nested_lists(node: &mut Node) {
    for child in &mut node.children {
        fix_nested_lists(child);
    }
    if !is_list(node) {
        return;
    }

    let children = std::mem::take(&mut node.children);
    for child in children {
        if is_list(&child) {
            if let Some(item) = node.children.iter_mut().rev().find(|c| c.is_tag("li")) {
                item.add_child(child);
                continue;
            }
        }
        node.children.push(child);
    }
}

fn apply_suggestions(node: &mut Node, suggestions: Suggestions) {
    match suggestions {
        Suggestions::Show => strip_suggestions(node, "ins", "del"),
        Suggestions::Hide => strip_suggestions(node, "del", "ins"),
        Suggestions::Html => {}
    }
}

fn strip_suggestions(node: &mut Node, keep: &str, drop: &str) {
    replace_children(node, |mut child| {
        if child.is_tag(drop) {
            return Vec::new();
        }
        strip_suggestions(&mut child, keep, drop);
        if child.is_tag(keep) {
            child.children
        } else {
            vec![child]
        }
    });
}

fn formatting_bit(node: &Node) -> Option<u16> {
    FORMATTING
        .iter()
        .position(|tag| node.is_tag(tag))
        .map(|index| 1 << index)
}

/// Unwrap formatting elements nested in an element of the same kind.
fn unwrap_nested_formatting(node: &mut Node, open: u16) {
    let open = open | formatting_bit(node).unwrap_or(0);
    replace_children(node, |mut child| {
        unwrap_nested_formatting(&mut child, open);
        match formatting_bit(&child) {
            Some(bit) if open & bit != 0 => child.children,
            _ => vec![child],
        }
    });
}

/// Merge adjacent siblings with the same formatting.
fn merge_adjacent_formatting(node: &mut Node) {
    let children = std::mem::take(&mut node.children);
    for child in children {
        if let Some(previous) = node.children.last_mut() {
            let mergeable = formatting_bit(&child).is_some()
                && previous.node_name == child.node_name
                && previous.attributes == child.attributes;
            if mergeable {
                previous.children.extend(child.children);
                continue;
            }
        }
        node.children.push(child);
    }

    for child in &mut node.children {
        merge_adjacent_formatting(child);
    }
}

/// Move whitespace at the edges of formatting elements outside of them.
fn hoist_whitespace(node: &mut Node) {
    replace_children(node, |mut child| {
        hoist_whitespace(&mut child);
        if formatting_bit(&child).is_none() || child.is_tag("code") {
            return vec![child];
        }

        let leading = take_leading_whitespace(&mut child);
        let trailing = take_trailing_whitespace(&mut child);
        let mut nodes = Vec::with_capacity(3);
        if !leading.is_empty() {
            nodes.push(Node::text(&leading));
        }
        nodes.push(child);
        if !trailing.is_empty() {
            nodes.push(Node::text(&trailing));
        }
        nodes
    });
}

fn take_leading_whitespace(node: &mut Node) -> String {
    let mut taken = String::new();
    while let Some(first) = node.children.first_mut() {
        if !first.is_text() {
            break;
        }
        let text = first.node_value.take().unwrap_or_default();
        let rest = text.trim_start();
        taken.push_str(&text[..text.len() - rest.len()]);
        if rest.is_empty() {
            node.children.remove(0);
            continue;
        }
        first.node_value = Some(rest.to_string());
        break;
    }
    taken
}

fn take_trailing_whitespace(node: &mut Node) -> String {
    let mut taken = String::new();
    while let Some(last) = node.children.last_mut() {
        if !last.is_text() {
            break;
        }
        let text = last.node_value.take().unwrap_or_default();
        let rest = text.trim_end();
        taken.insert_str(0, &text[rest.len()..]);
        if rest.is_empty() {
            node.children.pop();
            continue;
        }
        last.node_value = Some(rest.to_string());
        break;
    }
    taken
}
