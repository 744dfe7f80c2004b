//! Merge Slice Clip data into the HTML tree.
//!
//! Google's HTML loses some information the Slice Clip keeps: which text is
//! a suggested insertion or deletion, exact underline runs, and where
//! bookmarks sit. The clip's `spacers` string is aligned character by
//! character with the text of the HTML tree, and the clip's style runs and
//! entity positions are then projected onto the tree as `<ins>`, `<del>`,
//! `<u>` and `<a id>` elements.

use log::{debug, trace, warn};
use serde_json::Value;

use crate::node::Node;
use crate::slice_clip::SliceClip;
use crate::transform::TreeTransform;

/// How far ahead in `spacers` to look for a character of the HTML text.
const ALIGN_WINDOW: usize = 64;

const INSERT: u8 = 0b001;
const DELETE: u8 = 0b010;
const UNDERLINE: u8 = 0b100;

/// Elements whose text is not document text.
const SKIPPED: &[&str] = &["script", "style", "title", "head", "template"];

/// Tree transform projecting a decoded [`SliceClip`] onto the HTML.
#[derive(Debug, Clone, Copy)]
pub struct UpdateWithSliceClip<'a> {
    clip: &'a SliceClip,
}

impl<'a> UpdateWithSliceClip<'a> {
    pub fn new(clip: &'a SliceClip) -> Self {
        Self { clip }
    }

    /// Per-spacer-index mark flags from the clip's style slices.
    fn marks(&self, len: usize) -> Vec<u8> {
        let mut marks = vec![0u8; len];
        let mut apply = |kind: &str, flag: u8, is_marked: fn(&Value) -> bool| {
            if let Some(slice) = self.clip.style_slice(kind) {
                for run in slice.runs(len, is_marked) {
                    for mark in &mut marks[run] {
                        *mark |= flag;
                    }
                }
            }
        };

        apply("text", UNDERLINE, |style| style["ts_un"] == Value::Bool(true));
        apply("suggest_insert", INSERT, |style| has_ids(style, "sgi_ids"));
        apply("suggest_delete", DELETE, |style| has_ids(style, "sgd_ids"));
        marks
    }
}

fn has_ids(style: &Value, key: &str) -> bool {
    style[key].as_array().map_or(false, |ids| !ids.is_empty())
}

impl TreeTransform for UpdateWithSliceClip<'_> {
    fn transform(&self, tree: &mut Node) {
        let spacers: Vec<char> = self.clip.spacers.chars().collect();
        let marks = self.marks(spacers.len());
        let mut aligner = Aligner {
            spacers,
            marks,
            bookmarks: self.clip.bookmark_positions(),
            next_bookmark: 0,
            cursor: 0,
            unaligned: 0,
            wrapped: 0,
        };

        aligner.rewrite_children(tree);

        // Bookmarks past the end of the aligned text go at the end
        while let Some(id) = aligner.take_bookmark(usize::MAX) {
            tree.add_child(bookmark(&id));
        }

        if aligner.unaligned > 0 {
            warn!(
                "Slice clip did not line up with the HTML: {} characters left unaligned",
                aligner.unaligned
            );
        }
        debug!(
            "Enriched HTML from slice clip: {} marked segments, {} bookmarks",
            aligner.wrapped, aligner.next_bookmark
        );
    }
}

struct Aligner {
    spacers: Vec<char>,
    marks: Vec<u8>,
    bookmarks: Vec<(usize, String)>,
    next_bookmark: usize,
    cursor: usize,
    unaligned: usize,
    wrapped: usize,
}

impl Aligner {
    fn rewrite_children(&mut self, node: &mut Node) {
        if SKIPPED.contains(&node.tag_name()) {
            return;
        }

        let children = std::mem::take(&mut node.children);
        for mut child in children {
            if child.is_text() {
                let text = child.node_value.take().unwrap_or_default();
                node.children.extend(self.rewrite_text(&text));
            } else {
                self.rewrite_children(&mut child);
                node.children.push(child);
            }
        }
    }

    /// Split a text node into runs of constant marks, with bookmarks
    /// inserted before the characters they point at.
    fn rewrite_text(&mut self, text: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut segment = String::new();
        let mut segment_marks = 0u8;

        for c in text.chars() {
            let position = self.align(c);
            let marks = position
                .and_then(|p| self.marks.get(p).copied())
                .unwrap_or(0);

            if let Some(position) = position {
                while let Some(id) = self.take_bookmark(position) {
                    self.flush(&mut nodes, &mut segment, segment_marks);
                    nodes.push(bookmark(&id));
                }
            }

            if marks != segment_marks {
                self.flush(&mut nodes, &mut segment, segment_marks);
                segment_marks = marks;
            }
            segment.push(c);
        }

        self.flush(&mut nodes, &mut segment, segment_marks);
        nodes
    }

    fn flush(&mut self, nodes: &mut Vec<Node>, segment: &mut String, marks: u8) {
        if segment.is_empty() {
            return;
        }

        let mut node = Node::text(segment);
        segment.clear();
        if marks & UNDERLINE != 0 {
            node = Node::wrap("u", vec![node]);
        }
        if marks & DELETE != 0 {
            node = Node::wrap("del", vec![node]);
        }
        if marks & INSERT != 0 {
            node = Node::wrap("ins", vec![node]);
        }
        if marks != 0 {
            self.wrapped += 1;
        }
        nodes.push(node);
    }

    /// Next bookmark at or before `position`, if any.
    fn take_bookmark(&mut self, position: usize) -> Option<String> {
        let (at, id) = self.bookmarks.get(self.next_bookmark)?;
        if *at > position {
            return None;
        }
        self.next_bookmark += 1;
        Some(id.clone())
    }

    /// Find the spacer index for the next character of HTML text.
    fn align(&mut self, c: char) -> Option<usize> {
        let end = self.spacers.len().min(self.cursor + ALIGN_WINDOW);

        for index in self.cursor..end {
            let spacer = self.spacers[index];
            if same_char(c, spacer) {
                self.cursor = index + 1;
                return Some(index);
            }
            // Whitespace in the HTML may only skip invisible spacers
            if c.is_whitespace() && !is_skippable(spacer) {
                break;
            }
        }

        if !c.is_whitespace() {
            trace!("Unaligned character {:?} at spacer {}", c, self.cursor);
            self.unaligned += 1;
        }
        None
    }
}

fn same_char(html: char, spacer: char) -> bool {
    html == spacer || (html.is_whitespace() && spacer.is_whitespace())
}

fn is_skippable(spacer: char) -> bool {
    spacer.is_control() && !spacer.is_whitespace()
}

fn bookmark(id: &str) -> Node {
    Node::element_with_attrs("a", vec![("id", id)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{parse_html, to_html};
    use serde_json::json;

    fn clip(spacers: &str, slices: Value, entities: Value) -> SliceClip {
        serde_json::from_value(json!({
            "dsl_spacers": spacers,
            "dsl_styleslices": slices,
            "dsl_entitypositionmap": entities,
        }))
        .unwrap()
    }

    fn enrich(html: &str, clip: &SliceClip) -> String {
        let mut tree = parse_html(html);
        UpdateWithSliceClip::new(clip).transform(&mut tree);
        to_html(&tree)
    }

    #[test]
    fn test_underline_run() {
        let clip = clip(
            "one two",
            json!([{
                "stsl_type": "text",
                "stsl_styles": [{"ts_un": false}, null, null, null, {"ts_un": true}],
            }]),
            json!({}),
        );
        assert_eq!(enrich("<p>one two</p>", &clip), "<p>one <u>two</u></p>");
    }

    #[test]
    fn test_suggestions_across_elements() {
        let clip = clip(
            "\u{1c}ab\ncd",
            json!([
                {"stsl_type": "suggest_insert", "stsl_styles": [
                    {"sgi_ids": []}, null, {"sgi_ids": ["s1"]}, null, null, {"sgi_ids": []},
                ]},
                {"stsl_type": "suggest_delete", "stsl_styles": [
                    {"sgd_ids": []}, null, null, null, null, {"sgd_ids": ["s2"]},
                ]},
            ]),
            json!({}),
        );
        assert_eq!(
            enrich("<p>ab</p><p>cd</p>", &clip),
            "<p>a<ins>b</ins></p><p><ins>c</ins><del>d</del></p>"
        );
    }

    #[test]
    fn test_bookmarks_inserted() {
        let clip = clip(
            "Hello\nWorld",
            json!([]),
            json!({"id.start": [0], "id.world": [6], "id.end": [40], "h.skip": [1]}),
        );
        assert_eq!(
            enrich("<p>Hello</p><p><b>World</b></p>", &clip),
            concat!(
                r#"<p><a id="id.start"></a>Hello</p>"#,
                r#"<p><b><a id="id.world"></a>World</b></p>"#,
                r#"<a id="id.end"></a>"#,
            )
        );
    }

    #[test]
    fn test_nested_marks_order() {
        let clip = clip(
            "x",
            json!([
                {"stsl_type": "text", "stsl_styles": [{"ts_un": true}]},
                {"stsl_type": "suggest_insert", "stsl_styles": [{"sgi_ids": ["a"]}]},
                {"stsl_type": "suggest_delete", "stsl_styles": [{"sgd_ids": ["b"]}]},
            ]),
            json!({}),
        );
        assert_eq!(enrich("x", &clip), "<ins><del><u>x</u></del></ins>");
    }

    #[test]
    fn test_unaligned_text_is_left_alone() {
        let clip = clip(
            "abc",
            json!([{"stsl_type": "text", "stsl_styles": [{"ts_un": true}]}]),
            json!({}),
        );
        assert_eq!(enrich("<p>xyz</p>", &clip), "<p>xyz</p>");
    }

    #[test]
    fn test_style_text_not_aligned() {
        let clip = clip(
            "a",
            json!([{"stsl_type": "text", "stsl_styles": [{"ts_un": true}]}]),
            json!({}),
        );
        assert_eq!(
            enrich("<style>a{}</style><p>a</p>", &clip),
            "<style>a{}</style><p><u>a</u></p>"
        );
    }
}
