//! Handlers that keep the meaning Google Docs attaches to some elements.
//!
//! Headings keep their ids, links to headings use the heading's slug,
//! bookmarks survive as empty anchors, and markup Markdown has no syntax
//! for (`sub`, `sup`, `ins`, optionally `u`) passes through as HTML.

use docsmd_core::{Block, Fragment, Inline};

use super::defaults::{heading, link_to};
use super::Handlers;
use crate::convert::State;
use crate::node::{escape_attr, Node};
use crate::service::{HeadingIds, Underline};

/// The default handlers overlaid with the Google Docs specific ones.
pub fn semantic_handlers() -> Handlers {
    let mut handlers = Handlers::new();
    handlers.add("sub", preserve_tag_and_convert_contents);
    handlers.add("sup", preserve_tag_and_convert_contents);
    handlers.add("ins", preserve_tag_and_convert_contents);
    handlers.add("u", underline);
    for tag in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        handlers.add(tag, heading_with_id);
    }
    handlers.add("a", anchor);
    handlers
}

/// Keep the element's tag as literal HTML around its converted contents.
pub fn preserve_tag_and_convert_contents<'a>(
    state: &mut State<'a>,
    node: &'a Node,
) -> Vec<Fragment> {
    let tag = node.tag_name();
    let mut fragments = vec![Inline::HtmlInline(format!("<{}>", tag)).into()];
    fragments.extend(state.all(node));
    fragments.push(Inline::HtmlInline(format!("</{}>", tag)).into());
    fragments
}

fn underline<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    match state.options.underline {
        Underline::Html => preserve_tag_and_convert_contents(state, node),
        Underline::Underscore => vec![Inline::Underline(state.inlines(node)).into()],
    }
}

fn heading_with_id<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let mut fragments = heading(state, node);

    let id = match node.attr("id") {
        Some(id) if !id.is_empty() => id,
        _ => return fragments,
    };
    let marker = match state.options.heading_ids {
        HeadingIds::Hidden => return fragments,
        HeadingIds::Html => format!(r#"<a id="{}"></a>"#, escape_attr(id)),
        HeadingIds::Extended => format!(" {{#{}}}", id),
    };

    for fragment in &mut fragments {
        if let Fragment::Block(Block::Heading { content, .. }) = fragment {
            content.push(Inline::HtmlInline(marker.clone()));
        }
    }
    fragments
}

fn anchor<'a>(state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
    let href = node.attr("href");
    let name = node
        .attr("id")
        .or_else(|| node.attr("name"))
        .filter(|name| !name.is_empty());

    // Bookmark target: keep it so links into the document still resolve
    if let (Some(name), None) = (name, href) {
        let html = format!(r#"<a id="{}"></a>"#, escape_attr(name));
        return vec![Inline::HtmlInline(html).into()];
    }

    if state.options.heading_ids == HeadingIds::Hidden {
        let slug = href
            .and_then(|href| href.strip_prefix('#'))
            .filter(|id| state.element_by_id(id).map_or(false, is_heading))
            .and_then(|id| state.heading_slug(id))
            .map(|slug| format!("#{}", slug));
        if let Some(slug) = slug {
            return link_to(state, node, Some(&slug));
        }
    }

    link_to(state, node, href)
}

fn is_heading(node: &Node) -> bool {
    matches!(node.tag_name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}
