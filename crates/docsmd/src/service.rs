//! Entry points: convert Google Docs clipboard contents to Markdown.

use docsmd_core::{Block, CodeBlockStyle, Join, ListItemIndent};
use log::debug;
use serde_json::Value;

use crate::clean::CleanGoogleHtml;
use crate::convert::to_markdown_ast;
use crate::enrich::UpdateWithSliceClip;
use crate::html::{parse_html, to_html};
use crate::node::Node;
use crate::postprocess::post_process;
use crate::slice_clip::SliceClip;
use crate::transform::TreeTransform;
use crate::Result;

/// Code block style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlocks {
    /// Indented by four spaces
    #[default]
    Indented,
    /// Fenced with backticks
    Fenced,
}

/// How heading ids are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingIds {
    /// Not written; links to headings use the heading's slug instead
    #[default]
    Hidden,
    /// `<a id="ID"></a>` after the heading text
    Html,
    /// ` {#ID}` after the heading text
    Extended,
}

/// What to do with suggested edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suggestions {
    /// Show the document as if suggestions were accepted
    #[default]
    Show,
    /// Show the document as if suggestions were rejected
    Hide,
    /// Keep both as `<ins>`/`<del>`
    Html,
}

/// How underlined text is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Underline {
    /// `_text_`
    #[default]
    Underscore,
    /// `<u>text</u>`
    Html,
}

/// What happens to blank lines between blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreaking {
    /// Every blank-line separator becomes a single newline
    #[default]
    One,
    /// Every blank-line separator becomes a backslash hard break
    Backslash,
    /// Leave blank lines alone
    Keep,
}

/// Options for a conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Code block style
    pub code_blocks: CodeBlocks,

    /// How heading ids are written out
    pub heading_ids: HeadingIds,

    /// What to do with suggested edits
    pub suggestions: Suggestions,

    /// How underlined text is written
    pub underline: Underline,

    /// What happens to blank lines between blocks
    pub linebreaking: LineBreaking,

    /// Add quiz spoiler markup to the result
    pub spoiler: bool,
}

/// Two blank lines before a heading that follows something else.
fn double_blank_lines_before_headings(previous: &Block, next: &Block) -> Option<usize> {
    (!previous.is_heading() && next.is_heading()).then_some(2)
}

/// Serializer settings used for every conversion.
pub fn markdown_options(options: &Options) -> docsmd_core::Options {
    docsmd_core::Options {
        bullet: '-',
        emphasis: '_',
        strong: '*',
        underline: "_".to_string(),
        code_block_style: match options.code_blocks {
            CodeBlocks::Indented => CodeBlockStyle::Indented,
            CodeBlocks::Fenced => CodeBlockStyle::Fenced,
        },
        list_item_indent: ListItemIndent::One,
        join: vec![double_blank_lines_before_headings as Join],
        ..Default::default()
    }
}

fn parse_with_slice_clip(html: &str, slice_clip: Option<&Value>) -> Result<Node> {
    // Decode first so a bad clip fails before any HTML work
    let clip = match slice_clip {
        Some(raw) if !is_absent(raw) => Some(SliceClip::decode(raw)?),
        _ => None,
    };

    let mut tree = parse_html(html);
    if let Some(clip) = &clip {
        UpdateWithSliceClip::new(clip).transform(&mut tree);
    }
    Ok(tree)
}

/// `null` and the empty string mean "no clip", as a missing clipboard
/// entry does.
fn is_absent(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert Google Docs HTML, optionally enriched with its Slice Clip, to
/// Markdown.
///
/// Fails only if `slice_clip` is given and is not a Slice Clip.
pub fn convert(html: &str, slice_clip: Option<&Value>, options: &Options) -> Result<String> {
    let mut tree = parse_with_slice_clip(html, slice_clip)?;
    CleanGoogleHtml::new(options).transform(&mut tree);

    let ast = to_markdown_ast(&tree, options);
    let markdown = docsmd_core::serialize(&ast, &markdown_options(options));
    debug!("Serialized {} bytes of Markdown", markdown.len());

    Ok(post_process(&markdown, options))
}

/// Merge a Slice Clip into Google Docs HTML and return the enriched HTML.
pub fn combine_formats(html: &str, slice_clip: Option<&Value>) -> Result<String> {
    let tree = parse_with_slice_clip(html, slice_clip)?;
    Ok(to_html(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.code_blocks, CodeBlocks::Indented);
        assert_eq!(options.heading_ids, HeadingIds::Hidden);
        assert_eq!(options.suggestions, Suggestions::Show);
        assert_eq!(options.underline, Underline::Underscore);
        assert_eq!(options.linebreaking, LineBreaking::One);
        assert!(!options.spoiler);
    }

    #[test]
    fn test_convert_simple() {
        let markdown = convert("<p>Hello <b>World</b></p>", None, &Options::default()).unwrap();
        assert_eq!(markdown, "Hello **World**\n");
    }

    #[test]
    fn test_blank_lines_before_headings() {
        let html = "<p>intro</p><h2>A</h2><h3>B</h3><p>text</p>";
        let options = Options {
            linebreaking: LineBreaking::Keep,
            ..Default::default()
        };
        assert_eq!(
            convert(html, None, &options).unwrap(),
            "intro\n\n\n## A\n\n### B\n\ntext\n"
        );

        let one = convert(html, None, &Options::default()).unwrap();
        assert_eq!(one, "intro\n\n## A\n### B\ntext\n");
    }

    #[test]
    fn test_fenced_code() {
        let html = "<pre><code>x = 1</code></pre>";
        let options = Options {
            code_blocks: CodeBlocks::Fenced,
            linebreaking: LineBreaking::Keep,
            ..Default::default()
        };
        assert_eq!(convert(html, None, &options).unwrap(), "```\nx = 1\n```\n");
    }

    #[test]
    fn test_backslash_linebreaking() {
        let options = Options {
            linebreaking: LineBreaking::Backslash,
            ..Default::default()
        };
        assert_eq!(
            convert("<p>one</p><p>two</p>", None, &options).unwrap(),
            "one\\\ntwo\n"
        );
    }

    #[test]
    fn test_over_escapes_removed() {
        let markdown = convert("<p>1. [x] a.b &lt;tag&gt;</p>", None, &Options::default()).unwrap();
        assert_eq!(markdown, "1. [x] a.b <tag>\n");
    }

    #[test]
    fn test_bad_clip_fails_conversion() {
        let clip = json!({ "data": { "resolved": {} } });
        let err = convert("<p>x</p>", Some(&clip), &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(combine_formats("<p>x</p>", Some(&clip)).is_err());
    }

    #[test]
    fn test_absent_clip() {
        let html = "<p>x</p>";
        assert_eq!(combine_formats(html, Some(&Value::Null)).unwrap(), html);
        assert_eq!(combine_formats(html, Some(&json!(""))).unwrap(), html);
        assert_eq!(combine_formats(html, None).unwrap(), html);
    }

    #[test]
    fn test_combine_formats() {
        let clip = json!({
            "data": {
                "resolved": {
                    "dsl_spacers": "ab",
                    "dsl_entitypositionmap": {},
                    "dsl_styleslices": [
                        { "stsl_type": "text", "stsl_styles": [null, { "ts_un": true }] },
                    ],
                },
            },
        });
        assert_eq!(
            combine_formats("<p>ab</p>", Some(&clip)).unwrap(),
            "<p>a<u>b</u></p>"
        );
    }
}
