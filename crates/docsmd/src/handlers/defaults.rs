//! Default handlers for standard HTML elements.

use docsmd_core::{Block, Fragment, Inline, ListItem};

use super::Handler;
use crate::convert::{collapse_whitespace, trim_inlines, State};
use crate::node::Node;

/// Get the default handler for a tag, if there is one.
///
/// Elements without a handler convert their children in place.
pub fn default_handler(tag: &str) -> Option<Handler> {
    let handler: Handler = match tag {
        "p" => paragraph,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => heading,
        "blockquote" => blockquote,
        "ul" | "ol" => list,
        "li" => list_item,
        "pre" => code_block,
        "hr" => thematic_break,
        "table" => table,
        "a" => anchor,
        "img" => image,
        "strong" | "b" => strong,
        "em" | "i" => emphasis,
        "code" | "kbd" | "samp" | "tt" => inline_code,
        "br" => line_break,
        "del" | "s" | "strike" => strikethrough,
        "html" | "body" | "div" | "section" | "article" | "main" | "aside" | "header"
        | "footer" | "nav" | "figure" | "figcaption" | "address" | "form" | "fieldset"
        | "center" => container,
        "head" | "script" | "style" | "template" | "noscript" | "meta" | "title" | "link" => {
            ignore
        }
        _ => return None,
    };
    Some(handler)
}

fn paragraph<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let inlines = trim_inlines(state.inlines(node));
    if inlines.iter().all(|i| i.is_blank()) {
        return Vec::new();
    }
    vec![Block::Paragraph(inlines).into()]
}

/// Heading with level taken from the tag name
pub fn heading<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let level = node
        .tag_name()
        .get(1..)
        .and_then(|n| n.parse::<u8>().ok())
        .unwrap_or(1);
    let content = trim_inlines(state.inlines(node));
    vec![Block::Heading { level, content }.into()]
}

fn blockquote<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let blocks = state.blocks(node);
    if blocks.is_empty() {
        return Vec::new();
    }
    vec![Block::BlockQuote(blocks).into()]
}

fn list<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let ordered = node.is_tag("ol");
    let start = node
        .attr("start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1);

    let mut items = Vec::new();
    for child in node.children() {
        if child.is_tag("li") {
            items.push(ListItem::new(state.blocks(child)));
        } else if child.is_element() {
            // Stray content between items joins the previous item
            let blocks = state.blocks(child);
            match items.last_mut() {
                Some(ListItem { content }) => content.extend(blocks),
                None => items.push(ListItem::new(blocks)),
            }
        }
    }

    if items.is_empty() {
        return Vec::new();
    }
    vec![Block::List {
        ordered,
        start,
        items,
    }
    .into()]
}

/// An item outside of a list contributes its blocks directly
fn list_item<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    state.blocks(node).into_iter().map(Fragment::from).collect()
}

fn code_block<'a>(_state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let language = node
        .element_children()
        .find(|c| c.is_tag("code"))
        .and_then(|code| code.attr("class"))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
                .map(|l| l.to_string())
        });

    let mut code = String::new();
    node.walk(&mut |n| {
        if let Some(text) = n.text_value() {
            code.push_str(text);
        } else if n.is_tag("br") {
            code.push('\n');
        }
    });

    if code.trim().is_empty() {
        return Vec::new();
    }
    vec![Block::CodeBlock { language, code }.into()]
}

fn thematic_break<'a>(_state: &mut State<'a>, _node: &'a Node) -> Vec<Fragment> {
    vec![Block::ThematicBreak.into()]
}

fn table<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let mut headers: Vec<Vec<Inline>> = Vec::new();
    let mut rows: Vec<Vec<Vec<Inline>>> = Vec::new();

    let mut trs = Vec::new();
    for child in node.element_children() {
        match child.tag_name() {
            "thead" | "tbody" | "tfoot" => {
                trs.extend(child.element_children().filter(|c| c.is_tag("tr")))
            }
            "tr" => trs.push(child),
            _ => {}
        }
    }

    for tr in trs {
        let mut row = Vec::new();
        let mut is_header = true;
        for cell in tr.element_children() {
            if cell.is_tag("td") {
                is_header = false;
            } else if !cell.is_tag("th") {
                continue;
            }
            row.push(trim_inlines(state.inlines(cell)));
        }
        if row.is_empty() {
            continue;
        }
        if is_header && headers.is_empty() && rows.is_empty() {
            headers = row;
        } else {
            rows.push(row);
        }
    }

    // If no headers, use first row as headers
    if headers.is_empty() {
        if rows.is_empty() {
            return Vec::new();
        }
        headers = rows.remove(0);
    }

    vec![Block::Table { headers, rows }.into()]
}

fn anchor<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    link_to(state, node, node.attr("href"))
}

/// Convert an anchor's children into a link to `href`; without a target
/// the children are returned as they are.
pub fn link_to<'a>(state: &mut State<'a>, node: &'a Node, href: Option<&str>) -> Vec<Fragment> {
    let content = state.inlines(node);
    match href {
        Some(url) if !url.is_empty() => vec![Inline::Link {
            content,
            url: url.to_string(),
            title: node.attr("title").map(|t| t.to_string()),
        }
        .into()],
        _ => content.into_iter().map(Fragment::from).collect(),
    }
}

fn image<'a>(_state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let src = node.attr("src").unwrap_or("");
    if src.is_empty() {
        return Vec::new();
    }

    vec![Inline::Image {
        alt: collapse_whitespace(node.attr("alt").unwrap_or("")),
        url: src.to_string(),
        title: node.attr("title").map(|t| t.to_string()),
    }
    .into()]
}

/// Wrap converted children, unless they are blank
fn wrap_inlines<'a>(
    state: &mut State<'a>,
    node: &'a Node,
    wrap: fn(Vec<Inline>) -> Inline,
) -> Vec<Fragment> {
    let inner = state.inlines(node);
    if inner.iter().all(|i| i.is_blank()) {
        return inner.into_iter().map(Fragment::from).collect();
    }
    vec![wrap(inner).into()]
}

fn strong<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    wrap_inlines(state, node, Inline::Strong)
}

fn emphasis<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    wrap_inlines(state, node, Inline::Emphasis)
}

fn strikethrough<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    wrap_inlines(state, node, Inline::Strikethrough)
}

fn inline_code<'a>(_state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let code = collapse_whitespace(&node.text_content());
    if code.is_empty() {
        return Vec::new();
    }
    vec![Inline::Code(code).into()]
}

fn line_break<'a>(_state: &mut State<'a>, _node: &'a Node) -> Vec<Fragment> {
    vec![Inline::LineBreak.into()]
}

fn container<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    state.blocks(node).into_iter().map(Fragment::from).collect()
}

fn ignore<'a>(_state: &mut State<'a>, _node: &'a Node) -> Vec<Fragment> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::{markdown_options, Handlers, Options};
    use docsmd_core::serialize;

    fn markdown(html: &str) -> String {
        let root = parse_html(html);
        let options = Options::default();
        let mut state = State::new(&root, &options, Handlers::new());
        let blocks = state.blocks(&root);
        serialize(&Block::Document(blocks), &markdown_options(&options))
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(markdown("<h3>Three</h3>"), "### Three\n");
    }

    #[test]
    fn test_strong_and_emphasis() {
        assert_eq!(
            markdown("<p><b>bold</b> and <i>italic</i></p>"),
            "**bold** and _italic_\n"
        );
    }

    #[test]
    fn test_blank_formatting_keeps_space() {
        assert_eq!(markdown("<p>a<strong> </strong>b</p>"), "a b\n");
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            markdown(r#"<p><a href="https://example.com" title="Ex">site</a> <img src="x.png" alt="X"></p>"#),
            "[site](https://example.com \"Ex\") ![X](x.png)\n"
        );
        assert_eq!(markdown("<p><a>plain</a></p>"), "plain\n");
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(
            markdown(r#"<ol start="3"><li>c</li><li>d</li></ol>"#),
            "3. c\n4. d\n"
        );
    }

    #[test]
    fn test_code_block_language() {
        assert_eq!(
            markdown("<pre><code class=\"language-rust\">let x = 1;\n</code></pre>"),
            "    let x = 1;\n"
        );
    }

    #[test]
    fn test_table_first_row_header() {
        assert_eq!(
            markdown("<table><tr><td>a</td><td>b</td></tr><tr><td>1</td><td>2|3</td></tr></table>"),
            "| a   | b    |\n| --- | ---- |\n| 1   | 2\\|3 |\n"
        );
    }

    #[test]
    fn test_table_with_th() {
        assert_eq!(
            markdown("<table><thead><tr><th>h</th></tr></thead><tbody><tr><td><p>x</p><p>y</p></td></tr></tbody></table>"),
            "| h      |\n| ------ |\n| x<br>y |\n"
        );
    }

    #[test]
    fn test_strikethrough_and_code() {
        assert_eq!(
            markdown("<p><del>gone</del> <code>a  b</code></p>"),
            "~~gone~~ `a b`\n"
        );
    }

    #[test]
    fn test_blockquote_and_rule() {
        assert_eq!(markdown("<blockquote><p>q</p></blockquote><hr>"), "> q\n\n***\n");
    }

    #[test]
    fn test_ignored_elements() {
        assert_eq!(markdown("<style>p{}</style><p>x</p><template>t</template>"), "x\n");
    }
}
